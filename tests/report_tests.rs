use cohort::{
    compare::Comparison,
    feedback::{FeedbackOutcome, QualityReview},
    pipeline::Stage,
    report::{Report, ReportEntry, Verdict},
    sandbox::ExecutionResult,
};

fn wrong_output_entry() -> ReportEntry {
    ReportEntry {
        submission:    "alice".to_string(),
        verdict:       Verdict::WrongOutput,
        stage_reached: Stage::Compared,
        error:         None,
        entry_point:   Some("edu.app.Main".to_string()),
        build:         None,
        execution:     Some(ExecutionResult::Completed {
            stdout:       "helo\n".to_string(),
            stderr:       String::new(),
            exit_code:    0,
            elapsed_secs: 0.2,
            truncated:    false,
        }),
        comparison:    Some(Comparison::Mismatch {
            expected:        "hello".to_string(),
            actual:          "helo".to_string(),
            first_diff_line: 0,
        }),
        feedback:      Some(FeedbackOutcome::Scored(QualityReview {
            score:    Some(7.5),
            comments: vec!["Name your variables".to_string()],
        })),
    }
}

fn failed_entry() -> ReportEntry {
    ReportEntry {
        submission:    "bob".to_string(),
        verdict:       Verdict::ExtractionFailed,
        stage_reached: Stage::Discovered,
        error:         Some("unreadable or unrecognized archive: oops".to_string()),
        entry_point:   None,
        build:         None,
        execution:     None,
        comparison:    None,
        feedback:      Some(FeedbackOutcome::Unavailable {
            reason: "no sources were extracted, nothing to review".to_string(),
        }),
    }
}

#[test]
fn launch_failure_is_its_own_verdict() {
    let entry = ReportEntry {
        submission:    "erin".to_string(),
        verdict:       Verdict::ExecutionError,
        stage_reached: Stage::Located,
        error:         Some("Cannot find a Java runtime on path (java)".to_string()),
        entry_point:   Some("Main".to_string()),
        build:         None,
        execution:     None,
        comparison:    None,
        feedback:      None,
    };
    let report = Report {
        folder:  "submissions".to_string(),
        entries: vec![entry],
    };

    let json = report.to_json().expect("report should serialize");
    let value: serde_json::Value = serde_json::from_str(&json).expect("report should parse back");
    assert_eq!(value["entries"][0]["verdict"], "execution_error");

    let table = report.summary_table();
    assert!(table.contains("EXECUTION_ERROR"));
    assert!(table.contains("Cannot find a Java runtime"));
}

#[test]
fn report_serializes_every_entry_in_order() {
    let report = Report {
        folder:  "submissions".to_string(),
        entries: vec![wrong_output_entry(), failed_entry()],
    };

    let json = report.to_json().expect("report should serialize");
    let value: serde_json::Value = serde_json::from_str(&json).expect("report should parse back");

    let entries = value["entries"].as_array().expect("entries should be an array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["submission"], "alice");
    assert_eq!(entries[1]["submission"], "bob");
    assert_eq!(entries[0]["verdict"], "wrong_output");
    assert_eq!(entries[1]["verdict"], "extraction_failed");
}

#[test]
fn absent_stages_are_omitted_from_json() {
    let report = Report {
        folder:  "submissions".to_string(),
        entries: vec![failed_entry()],
    };

    let json = report.to_json().expect("report should serialize");
    let value: serde_json::Value = serde_json::from_str(&json).expect("report should parse back");
    let entry = &value["entries"][0];

    assert!(entry.get("execution").is_none());
    assert!(entry.get("comparison").is_none());
    assert!(entry.get("entry_point").is_none());
    assert_eq!(entry["stage_reached"], "discovered");
    assert_eq!(entry["feedback"]["status"], "unavailable");
}

#[test]
fn scored_feedback_round_trips() {
    let json = serde_json::to_string(&wrong_output_entry()).expect("entry should serialize");
    let back: ReportEntry = serde_json::from_str(&json).expect("entry should parse back");

    match back.feedback {
        Some(FeedbackOutcome::Scored(review)) => {
            assert_eq!(review.score, Some(7.5));
            assert_eq!(review.comments.len(), 1);
        }
        other => panic!("expected scored feedback, got {other:?}"),
    }
}

#[test]
fn summary_table_names_every_submission() {
    let report = Report {
        folder:  "submissions".to_string(),
        entries: vec![wrong_output_entry(), failed_entry()],
    };

    let table = report.summary_table();
    assert!(table.contains("alice"));
    assert!(table.contains("bob"));
    assert!(table.contains("WRONG_OUTPUT"));
    assert!(table.contains("first divergence at line 0"));
}
