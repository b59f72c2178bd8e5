#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled, settings::Style};

use crate::{
    compare::Comparison,
    feedback::FeedbackOutcome,
    java::BuildOutcome,
    pipeline::Stage,
    sandbox::ExecutionResult,
};

/// Final per-submission classification combining build, execution, and
/// comparison outcomes. Quality feedback never influences the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Output matched the expected reference.
    Correct,
    /// The program ran but printed something else.
    WrongOutput,
    /// The program exited non-zero, so no comparison was made. A distinct
    /// category rather than a guessed pass/fail.
    NotCompared,
    /// The wall-clock budget was exceeded.
    Timeout,
    /// The program died abnormally.
    Crashed,
    /// The program could not be launched at all (missing `java` runtime or
    /// spawn failure) — an infrastructure condition, not a student fault.
    ExecutionError,
    /// The sources did not compile.
    BuildFailed,
    /// No class with a `main` method was found.
    NoEntryPoint,
    /// More than one candidate entry point was found.
    AmbiguousEntryPoint,
    /// The archive could not be unpacked.
    ExtractionFailed,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Verdict::Correct => "CORRECT",
            Verdict::WrongOutput => "WRONG_OUTPUT",
            Verdict::NotCompared => "NOT_COMPARED",
            Verdict::Timeout => "TIMEOUT",
            Verdict::Crashed => "CRASHED",
            Verdict::ExecutionError => "EXECUTION_ERROR",
            Verdict::BuildFailed => "BUILD_FAILED",
            Verdict::NoEntryPoint => "NO_ENTRY_POINT",
            Verdict::AmbiguousEntryPoint => "AMBIGUOUS_ENTRY_POINT",
            Verdict::ExtractionFailed => "EXTRACTION_FAILED",
        };
        write!(f, "{label}")
    }
}

impl Verdict {
    /// Terminal-colored rendering for the summary table.
    fn colored_label(&self) -> String {
        match self {
            Verdict::Correct => self.to_string().green().to_string(),
            Verdict::WrongOutput | Verdict::NotCompared => self.to_string().yellow().to_string(),
            _ => self.to_string().red().to_string(),
        }
    }
}

/// Everything recorded for one submission.
///
/// Later-stage fields are populated only when every preceding correctness
/// stage succeeded; `feedback` is independent of the rest and may be present
/// even when the build failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Submission identifier derived from the folder/archive name.
    pub submission:    String,
    /// Derived overall verdict.
    pub verdict:       Verdict,
    /// The last pipeline stage this submission reached.
    pub stage_reached: Stage,
    /// Infrastructure failure detail, when a stage errored rather than
    /// producing a graded outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:         Option<String>,
    /// Fully qualified name of the executed class, once located.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point:   Option<String>,
    /// Build outcome; absent when extraction already failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build:         Option<BuildOutcome>,
    /// Execution outcome; absent when the build failed or no entry point
    /// could be designated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution:     Option<ExecutionResult>,
    /// Output comparison; only meaningful for a completed execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison:    Option<Comparison>,
    /// Quality feedback, attempted regardless of the correctness outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback:      Option<FeedbackOutcome>,
}

impl ReportEntry {
    /// A one-line human explanation for the summary table.
    fn detail(&self) -> String {
        if let Some(error) = &self.error {
            return error.clone();
        }

        match self.verdict {
            Verdict::Correct => "got expected output".to_string(),
            Verdict::WrongOutput => match &self.comparison {
                Some(Comparison::Mismatch {
                    first_diff_line, ..
                }) => format!("first divergence at line {first_diff_line}"),
                _ => "output mismatch".to_string(),
            },
            Verdict::NotCompared => match &self.execution {
                Some(ExecutionResult::Completed { exit_code, .. }) => {
                    format!("exited with code {exit_code}; comparison skipped")
                }
                _ => "comparison skipped".to_string(),
            },
            Verdict::Timeout => match &self.execution {
                Some(ExecutionResult::TimedOut { elapsed_secs, .. }) => {
                    format!("killed after {elapsed_secs:.1}s")
                }
                _ => "killed at deadline".to_string(),
            },
            Verdict::Crashed => match &self.execution {
                Some(ExecutionResult::Crashed {
                    signal: Some(sig), ..
                }) => format!("terminated by signal {sig}"),
                _ => "abnormal termination".to_string(),
            },
            Verdict::ExecutionError => "could not launch the program".to_string(),
            Verdict::BuildFailed => "compiler diagnostics recorded".to_string(),
            Verdict::NoEntryPoint => "no main method found".to_string(),
            Verdict::AmbiguousEntryPoint => "multiple main methods found".to_string(),
            Verdict::ExtractionFailed => "could not unpack submission".to_string(),
        }
    }
}

/// One row of the human-readable summary table.
#[derive(Tabled)]
struct SummaryRow {
    /// Submission identifier.
    #[tabled(rename = "Submission")]
    submission: String,
    /// Colored verdict label.
    #[tabled(rename = "Verdict")]
    verdict:    String,
    /// One-line explanation.
    #[tabled(rename = "Detail")]
    detail:     String,
}

/// The full grading report: one entry per discovered submission, in
/// discovery order, persisted once after all submissions complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// The folder that was graded.
    pub folder:  String,
    /// Per-submission entries, insertion order = discovery order.
    pub entries: Vec<ReportEntry>,
}

impl Report {
    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Could not serialize report")
    }

    /// Renders the summary table shown after grading.
    pub fn summary_table(&self) -> String {
        let rows: Vec<SummaryRow> = self
            .entries
            .iter()
            .map(|entry| SummaryRow {
                submission: entry.submission.clone(),
                verdict:    entry.verdict.colored_label(),
                detail:     entry.detail(),
            })
            .collect();

        Table::new(rows).with(Style::modern()).to_string()
    }
}
