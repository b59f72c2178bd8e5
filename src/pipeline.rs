#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    compare::{Comparison, compare_output},
    config::GraderConfig,
    extract::extract_submission,
    feedback::{FeedbackOutcome, ReviewRequest, request_review},
    java::{BuildOutcome, EntryPointError, SourceTree, compile},
    report::{ReportEntry, Verdict},
    sandbox::{ExecutionResult, run_entry_point},
};

/// How far a submission got before grading stopped (or finished).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// The submission was found in the folder but nothing has run yet.
    Discovered,
    /// Sources were unpacked into the scratch directory.
    Extracted,
    /// `javac` accepted the sources.
    Built,
    /// A single entry point was designated.
    Located,
    /// The program ran to some terminal state.
    Executed,
    /// Output was compared against the reference.
    Compared,
}

/// One discovered submission: its identifier and the directory or archive
/// it came from.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Identifier derived from the folder or archive name.
    pub id:     String,
    /// Path to the submission directory or `.zip` file.
    pub source: PathBuf,
}

/// Assignment-level inputs shared by every submission.
#[derive(Debug, Clone)]
pub struct GradingInputs {
    /// The assignment prompt shown to the reviewer model.
    pub description:     String,
    /// Reference stdout the submissions are compared against.
    pub expected_output: String,
}

/// Artifacts accumulated while a submission moves through the pipeline,
/// used to assemble the feedback request at the end.
#[derive(Default)]
struct Collected {
    /// Concatenated source listing, once discovery succeeded.
    sources:     Option<String>,
    /// Compiler diagnostics, when the build failed.
    diagnostics: Option<String>,
    /// Whatever the program printed on stdout, for any terminal state.
    actual:      Option<String>,
}

/// Grades one submission end to end. Never fails: every infrastructure
/// error is folded into the returned entry so one bad submission cannot
/// take down the batch.
pub async fn grade_submission(
    cfg: &GraderConfig,
    submission: &Submission,
    inputs: &GradingInputs,
    scratch_root: &Path,
) -> ReportEntry {
    let scratch = scratch_root.join(&submission.id);
    let mut entry = blank_entry(&submission.id);
    let mut collected = Collected::default();

    run_stages(cfg, submission, inputs, &scratch, &mut entry, &mut collected).await;

    entry.feedback = Some(quality_feedback(cfg, inputs, &collected).await);

    if cfg.keep_scratch {
        info!(
            "Keeping scratch directory for {} at {}",
            submission.id,
            scratch.display()
        );
    } else if scratch.exists() {
        if let Err(e) = std::fs::remove_dir_all(&scratch) {
            warn!(
                "Could not remove scratch directory {}: {e}",
                scratch.display()
            );
        }
    }

    entry
}

/// A fresh entry for a submission that has only been discovered.
fn blank_entry(id: &str) -> ReportEntry {
    ReportEntry {
        submission:    id.to_string(),
        verdict:       Verdict::ExtractionFailed,
        stage_reached: Stage::Discovered,
        error:         None,
        entry_point:   None,
        build:         None,
        execution:     None,
        comparison:    None,
        feedback:      None,
    }
}

/// Runs the correctness stages in order, short-circuiting on the first
/// failure and recording how far the submission got.
async fn run_stages(
    cfg: &GraderConfig,
    submission: &Submission,
    inputs: &GradingInputs,
    scratch: &Path,
    entry: &mut ReportEntry,
    collected: &mut Collected,
) {
    let src_dir = match extract_submission(&submission.source, scratch, cfg.max_uncompressed) {
        Ok(dir) => dir,
        Err(e) => {
            entry.verdict = Verdict::ExtractionFailed;
            entry.error = Some(e.to_string());
            return;
        }
    };
    entry.stage_reached = Stage::Extracted;

    let tree = match SourceTree::discover(&src_dir) {
        Ok(tree) => tree,
        Err(e) => {
            entry.verdict = Verdict::ExtractionFailed;
            entry.error = Some(format!("{e:#}"));
            return;
        }
    };
    collected.sources = Some(tree.render_sources());

    let build_dir = scratch.join("build");
    let build = match compile(&tree, &build_dir, cfg.build_timeout).await {
        Ok(outcome) => outcome,
        Err(e) => {
            entry.verdict = Verdict::BuildFailed;
            entry.error = Some(format!("{e:#}"));
            return;
        }
    };
    let success = build.is_success();
    if let BuildOutcome::Failure { diagnostics } = &build {
        collected.diagnostics = Some(diagnostics.clone());
    }
    entry.build = Some(build);
    if !success {
        entry.verdict = Verdict::BuildFailed;
        return;
    }
    entry.stage_reached = Stage::Built;

    let fqcn = match tree.entry_point() {
        Ok(fqcn) => fqcn,
        Err(e @ EntryPointError::NoneFound) => {
            entry.verdict = Verdict::NoEntryPoint;
            entry.error = Some(e.to_string());
            return;
        }
        Err(e @ EntryPointError::Ambiguous { .. }) => {
            entry.verdict = Verdict::AmbiguousEntryPoint;
            entry.error = Some(e.to_string());
            return;
        }
    };
    entry.entry_point = Some(fqcn.clone());
    entry.stage_reached = Stage::Located;

    let execution = match run_entry_point(
        &build_dir,
        &fqcn,
        &src_dir,
        cfg.run_timeout,
        cfg.output_cap,
    )
    .await
    {
        Ok(result) => result,
        Err(e) => {
            // Failing to launch (no java on PATH, spawn error) is the
            // grader's problem, not the student's.
            entry.verdict = Verdict::ExecutionError;
            entry.error = Some(format!("{e:#}"));
            return;
        }
    };
    collected.actual = Some(execution.stdout().to_string());
    entry.stage_reached = Stage::Executed;

    match &execution {
        ExecutionResult::TimedOut { .. } => entry.verdict = Verdict::Timeout,
        ExecutionResult::Crashed { .. } => entry.verdict = Verdict::Crashed,
        ExecutionResult::Completed {
            exit_code, stdout, ..
        } => {
            if *exit_code != 0 && !cfg.compare_on_nonzero {
                entry.verdict = Verdict::NotCompared;
            } else {
                let comparison = compare_output(&inputs.expected_output, stdout);
                entry.verdict = match comparison {
                    Comparison::Match => Verdict::Correct,
                    Comparison::Mismatch { .. } => Verdict::WrongOutput,
                };
                entry.comparison = Some(comparison);
                entry.stage_reached = Stage::Compared;
            }
        }
    }
    entry.execution = Some(execution);
}

/// Requests the quality review with whatever artifacts the pipeline
/// produced. Runs regardless of the correctness verdict.
async fn quality_feedback(
    cfg: &GraderConfig,
    inputs: &GradingInputs,
    collected: &Collected,
) -> FeedbackOutcome {
    let Some(sources) = &collected.sources else {
        return FeedbackOutcome::Unavailable {
            reason: "no sources were extracted, nothing to review".to_string(),
        };
    };

    let request = ReviewRequest::builder()
        .description(inputs.description.as_str())
        .expected_output(inputs.expected_output.as_str())
        .sources(sources.as_str())
        .maybe_actual_output(collected.actual.clone())
        .maybe_diagnostics(collected.diagnostics.clone())
        .build();

    request_review(cfg, &request).await
}
