#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{ffi::OsString, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::project::SourceTree;
use crate::{
    process::{self, RunOutcome},
    util::javac_path,
};

/// Cap on captured javac output; compiler diagnostics past this are cut off.
const DIAG_CAP: usize = 256 * 1024;

/// Outcome of compiling one submission. Build failure is an expected,
/// first-class result carrying the compiler's own words, never an `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    /// Every source compiled; artifacts live in `build_dir`.
    Success {
        /// Directory holding the compiled `.class` files.
        build_dir: std::path::PathBuf,
    },
    /// Compilation failed (or could not be attempted); `diagnostics` holds
    /// the toolchain's raw output.
    Failure {
        /// Raw diagnostic text from javac, or a synthesized reason.
        diagnostics: String,
    },
}

impl BuildOutcome {
    /// Returns true for the `Success` variant.
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success { .. })
    }
}

/// Compiles every discovered source in `tree` into `build_dir`.
///
/// Sources are passed to javac through an `@sources.txt` argfile so large
/// submissions do not hit command-line length limits. The combined
/// stdout/stderr is mirrored to `compile.log` inside the build directory.
/// A partial compile (javac exits non-zero) is a `Failure`.
pub async fn compile(
    tree: &SourceTree,
    build_dir: &Path,
    timeout: Duration,
) -> Result<BuildOutcome> {
    if tree.is_empty() {
        return Ok(BuildOutcome::Failure {
            diagnostics: format!("No .java sources under {}", tree.root().display()),
        });
    }

    let javac = match javac_path() {
        Ok(path) => path,
        Err(_) => {
            return Ok(BuildOutcome::Failure {
                diagnostics: "javac not found on PATH".to_string(),
            });
        }
    };

    std::fs::create_dir_all(build_dir)
        .with_context(|| format!("Could not create build dir {}", build_dir.display()))?;

    let argfile = build_dir.join("sources.txt");
    let listing = tree
        .files()
        .iter()
        .map(|f| f.path().display().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    std::fs::write(&argfile, listing).context("Failed to write javac argfile")?;

    let args: Vec<OsString> = vec![
        OsString::from("-encoding"),
        OsString::from("UTF-8"),
        OsString::from("-d"),
        build_dir.as_os_str().to_owned(),
        OsString::from(format!("@{}", argfile.display())),
    ];

    let outcome = process::run_collect(&javac, &args, None, Some(timeout), DIAG_CAP).await?;

    let (diagnostics, succeeded) = match outcome {
        RunOutcome::Exited(collected) => {
            let text = [collected.stderr.to_text(), collected.stdout.to_text()].concat();
            (text, collected.status.success())
        }
        RunOutcome::DeadlineExceeded { stderr, .. } => {
            let mut text = stderr.to_text();
            text.push_str(&format!("\ncompilation timed out after {timeout:?}"));
            (text, false)
        }
    };

    // Best effort; a missing log never fails the build.
    let _ = std::fs::write(build_dir.join("compile.log"), &diagnostics);

    if succeeded {
        Ok(BuildOutcome::Success {
            build_dir: build_dir.to_path_buf(),
        })
    } else {
        Ok(BuildOutcome::Failure { diagnostics })
    }
}
