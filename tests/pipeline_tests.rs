use std::path::PathBuf;

use cohort::{
    config::GraderConfig,
    feedback::FeedbackOutcome,
    pipeline::{GradingInputs, Stage, Submission, grade_submission},
    report::Verdict,
};
use tempfile::TempDir;

fn test_config() -> GraderConfig {
    let mut cfg = GraderConfig::from_env();
    cfg.ai_enabled = false;
    cfg
}

fn test_inputs() -> GradingInputs {
    GradingInputs {
        description:     "Print the answer.".to_string(),
        expected_output: "42\n".to_string(),
    }
}

#[tokio::test]
async fn unreadable_archive_still_yields_a_full_entry() {
    let scratch_root = TempDir::new().expect("should create temp dir");
    let folder = TempDir::new().expect("should create temp dir");
    let archive = folder.path().join("mallory.zip");
    std::fs::write(&archive, b"definitely not a zip").expect("should write file");

    let submission = Submission {
        id:     "mallory".to_string(),
        source: archive,
    };
    let entry = grade_submission(
        &test_config(),
        &submission,
        &test_inputs(),
        scratch_root.path(),
    )
    .await;

    assert_eq!(entry.submission, "mallory");
    assert_eq!(entry.verdict, Verdict::ExtractionFailed);
    assert_eq!(entry.stage_reached, Stage::Discovered);
    assert!(entry.error.is_some());
    assert!(entry.execution.is_none());
    assert!(entry.comparison.is_none());
    assert!(matches!(
        entry.feedback,
        Some(FeedbackOutcome::Unavailable { .. })
    ));
    // The failed submission's scratch directory is cleaned up.
    assert!(!scratch_root.path().join("mallory").exists());
}

#[tokio::test]
async fn missing_submission_path_is_an_extraction_failure() {
    let scratch_root = TempDir::new().expect("should create temp dir");
    let submission = Submission {
        id:     "ghost".to_string(),
        source: PathBuf::from("/nonexistent/ghost.zip"),
    };

    let entry = grade_submission(
        &test_config(),
        &submission,
        &test_inputs(),
        scratch_root.path(),
    )
    .await;

    assert_eq!(entry.verdict, Verdict::ExtractionFailed);
    assert!(entry.error.is_some());
}

#[tokio::test]
async fn keep_scratch_leaves_the_directory_behind() {
    let scratch_root = TempDir::new().expect("should create temp dir");
    let folder = TempDir::new().expect("should create temp dir");
    let submission_dir = folder.path().join("dave");
    std::fs::create_dir(&submission_dir).expect("should create dir");
    std::fs::write(submission_dir.join("notes.txt"), "no java here")
        .expect("should write file");

    let mut cfg = test_config();
    cfg.keep_scratch = true;

    let submission = Submission {
        id:     "dave".to_string(),
        source: submission_dir,
    };
    let entry = grade_submission(&cfg, &submission, &test_inputs(), scratch_root.path()).await;

    // No .java files: the build records a failure diagnostic.
    assert_eq!(entry.verdict, Verdict::BuildFailed);
    assert!(scratch_root.path().join("dave").exists());
}
