#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::HashSet, path::Path, sync::Arc};

use anyhow::{Context, Result, anyhow};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::{
    config::GraderConfig,
    pipeline::{GradingInputs, Stage, Submission, grade_submission},
    report::{Report, ReportEntry, Verdict},
};

/// Finds gradeable submissions directly under `folder`: every directory
/// and every `.zip` file. Anything else is skipped with a log line.
///
/// Returned submissions are sorted by identifier so the report order does
/// not depend on filesystem iteration order.
pub fn discover_submissions(folder: &Path) -> Result<Vec<Submission>> {
    let mut dirs = Vec::new();
    let mut archives = Vec::new();

    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("Could not read submissions folder {}", folder.display()))?;

    for dir_entry in entries {
        let dir_entry = dir_entry
            .with_context(|| format!("Could not read an entry of {}", folder.display()))?;
        let path = dir_entry.path();
        let file_name = dir_entry.file_name().to_string_lossy().into_owned();

        if path.is_dir() {
            dirs.push((file_name, path));
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
        {
            archives.push((file_name, path));
        } else {
            info!("Skipping {file_name}: not a directory or .zip archive");
        }
    }

    // Directories claim their names first; a `.zip` whose stem collides with
    // a directory (or another archive) falls back to its full file name, so
    // neither submission silently shadows the other.
    let mut submissions = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();

    for (file_name, path) in dirs {
        if !taken.insert(file_name.clone()) {
            warn!("Skipping duplicate submission identifier {file_name}");
            continue;
        }
        submissions.push(Submission {
            id:     file_name,
            source: path,
        });
    }

    for (file_name, path) in archives {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());
        let id = if taken.contains(&stem) { file_name } else { stem };
        if !taken.insert(id.clone()) {
            warn!("Skipping duplicate submission identifier {id}");
            continue;
        }
        submissions.push(Submission { id, source: path });
    }

    submissions.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(submissions)
}

/// Grades every submission under `folder` and assembles the report.
///
/// Submissions run concurrently, bounded by `cfg.jobs`, but the report
/// always lists them in discovery order with exactly one entry each.
pub async fn grade_folder(
    cfg: GraderConfig,
    folder: &Path,
    inputs: GradingInputs,
) -> Result<Report> {
    let submissions = discover_submissions(folder)?;
    if submissions.is_empty() {
        return Err(anyhow!(
            "No submissions (directories or .zip files) found under {}",
            folder.display()
        ));
    }
    info!(
        "Grading {} submission(s) with up to {} running at once",
        submissions.len(),
        cfg.jobs
    );

    let scratch_dir = tempfile::Builder::new()
        .prefix("cohort-")
        .tempdir()
        .context("Could not create scratch directory")?;
    let scratch_root = if cfg.keep_scratch {
        let path = scratch_dir.keep();
        info!("Scratch directories kept under {}", path.display());
        path
    } else {
        scratch_dir.path().to_path_buf()
    };

    let cfg = Arc::new(cfg);
    let inputs = Arc::new(inputs);
    let semaphore = Arc::new(Semaphore::new(cfg.jobs));

    let mut handles = Vec::with_capacity(submissions.len());
    for (idx, submission) in submissions.iter().cloned().enumerate() {
        let cfg = Arc::clone(&cfg);
        let inputs = Arc::clone(&inputs);
        let semaphore = Arc::clone(&semaphore);
        let scratch_root = scratch_root.clone();

        handles.push(tokio::spawn(async move {
            // Closed only when the semaphore is dropped, which cannot
            // happen while this task holds a clone of the Arc.
            let _permit = semaphore.acquire().await;
            let entry = grade_submission(&cfg, &submission, &inputs, &scratch_root).await;
            info!("{}: {}", submission.id, entry.verdict);
            (idx, entry)
        }));
    }

    let mut slots: Vec<Option<ReportEntry>> = vec![None; submissions.len()];
    for handle in handles {
        match handle.await {
            Ok((idx, entry)) => slots[idx] = Some(entry),
            Err(e) => warn!("A grading task panicked: {e}"),
        }
    }

    let entries = submissions
        .iter()
        .zip(slots)
        .map(|(submission, slot)| {
            slot.unwrap_or_else(|| panicked_entry(&submission.id))
        })
        .collect();

    Ok(Report {
        folder: folder.display().to_string(),
        entries,
    })
}

/// Fallback entry for a submission whose grading task panicked, so the
/// report still carries one entry per discovered submission.
fn panicked_entry(id: &str) -> ReportEntry {
    ReportEntry {
        submission:    id.to_string(),
        verdict:       Verdict::ExtractionFailed,
        stage_reached: Stage::Discovered,
        error:         Some("grading task failed unexpectedly".to_string()),
        entry_point:   None,
        build:         None,
        execution:     None,
        comparison:    None,
        feedback:      None,
    }
}
