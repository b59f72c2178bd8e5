//! Batch autograder for introductory Java assignments.
//!
//! Point it at a folder of submissions (one directory or `.zip` archive per
//! student), give it the reference stdout and the assignment description,
//! and it produces `results.json` plus a summary table: each submission is
//! extracted, compiled, run in a time-bounded sandbox, diffed against the
//! reference, and optionally sent to an OpenAI-compatible endpoint for a
//! code-quality review.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, ensure};
use bpaf::*;
use cohort::{
    compare::{Comparison, render_diff},
    config::GraderConfig,
    orchestrator::grade_folder,
    pipeline::GradingInputs,
};
use dotenvy::dotenv;
use tracing::{Level, info, metadata::LevelFilter, warn};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Text used in place of a missing assignment description.
const DESCRIPTION_PLACEHOLDER: &str = "No assignment description was provided.";

/// Text used in place of a missing reference output. Deliberately not
/// something a program would print, so nothing can match a reference that
/// was never loaded.
const EXPECTED_OUTPUT_PLACEHOLDER: &str = "No Expected Output Given";

/// Parsed command line.
#[derive(Debug, Clone)]
struct Options {
    /// Path to the reference stdout file.
    expected_output:    Option<PathBuf>,
    /// Path to the assignment description file.
    description:        Option<PathBuf>,
    /// Concurrency override.
    jobs:               Option<usize>,
    /// Per-run wall-clock budget override, in seconds.
    timeout:            Option<u64>,
    /// Skip the quality-feedback stage entirely.
    no_ai:              bool,
    /// Compare output even when the program exited non-zero.
    compare_on_nonzero: bool,
    /// Keep per-submission scratch directories for inspection.
    keep_scratch:       bool,
    /// Where to write the JSON report.
    out:                PathBuf,
    /// Folder holding the submissions.
    folder:             PathBuf,
}

/// Builds and runs the command-line parser.
fn options() -> Options {
    let expected_output = long("expected-output")
        .short('e')
        .help("Reference stdout file (default: FOLDER/expected_output.txt)")
        .argument::<PathBuf>("FILE")
        .optional();

    let description = long("description")
        .short('d')
        .help("Assignment description file (default: FOLDER/description.md)")
        .argument::<PathBuf>("FILE")
        .optional();

    let jobs = long("jobs")
        .short('j')
        .help("Number of submissions graded concurrently")
        .argument::<usize>("N")
        .optional();

    let timeout = long("timeout")
        .short('t')
        .help("Wall-clock budget per program run, in seconds")
        .argument::<u64>("SECS")
        .optional();

    let no_ai = long("no-ai")
        .help("Skip the code-quality review stage")
        .switch();

    let compare_on_nonzero = long("compare-on-nonzero")
        .help("Diff output even when the program exits non-zero")
        .switch();

    let keep_scratch = long("keep-scratch")
        .help("Keep per-submission scratch directories after grading")
        .switch();

    let out = long("out")
        .short('o')
        .help("Where to write the JSON report")
        .argument::<PathBuf>("FILE")
        .fallback(PathBuf::from("results.json"));

    let folder = positional::<PathBuf>("FOLDER")
        .help("Folder with one submission (directory or .zip) per student");

    construct!(Options {
        expected_output,
        description,
        jobs,
        timeout,
        no_ai,
        compare_on_nonzero,
        keep_scratch,
        out,
        folder,
    })
    .to_options()
    .descr("Batch autograder for Java assignments")
    .run()
}

/// Reads an assignment input file, substituting `placeholder` with a
/// warning when the file cannot be read. A missing description or
/// reference file degrades the run instead of aborting it.
fn read_input(path: &PathBuf, what: &str, placeholder: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(
                "Could not read the {what} at {}: {e}. Using a placeholder.",
                path.display()
            );
            placeholder.to_string()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let opts = options();
    ensure!(
        opts.folder.is_dir(),
        "{} is not a directory",
        opts.folder.display()
    );

    let mut cfg = GraderConfig::from_env();
    if let Some(jobs) = opts.jobs {
        cfg.jobs = jobs.max(1);
    }
    if let Some(secs) = opts.timeout {
        cfg.run_timeout = Duration::from_secs(secs);
    }
    if opts.no_ai {
        cfg.ai_enabled = false;
    }
    cfg.compare_on_nonzero = opts.compare_on_nonzero;
    cfg.keep_scratch = opts.keep_scratch;

    let expected_path = opts
        .expected_output
        .unwrap_or_else(|| opts.folder.join("expected_output.txt"));
    let description_path = opts
        .description
        .unwrap_or_else(|| opts.folder.join("description.md"));

    let inputs = GradingInputs {
        description:     read_input(
            &description_path,
            "assignment description",
            DESCRIPTION_PLACEHOLDER,
        ),
        expected_output: read_input(
            &expected_path,
            "reference output",
            EXPECTED_OUTPUT_PLACEHOLDER,
        ),
    };

    let report = grade_folder(cfg, &opts.folder, inputs).await?;

    for entry in &report.entries {
        if let Some(Comparison::Mismatch {
            expected, actual, ..
        }) = &entry.comparison
        {
            info!(
                "Output diff for {}:\n{}",
                entry.submission,
                render_diff(expected, actual)
            );
        }
    }

    let json = report.to_json()?;
    std::fs::write(&opts.out, &json)
        .with_context(|| format!("Could not write report to {}", opts.out.display()))?;

    println!("{}", report.summary_table());
    info!("Report written to {}", opts.out.display());

    Ok(())
}
