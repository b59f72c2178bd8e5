#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{ffi::OsString, path::Path, time::Duration};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{
    process::{self, RunOutcome},
    util::java_path,
};

/// How one student program execution ended.
///
/// A non-zero exit code is not a sandbox failure; it is recorded in
/// `Completed` and left for the comparator policy to interpret.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// The process exited on its own within the budget.
    Completed {
        /// Captured stdout, truncated at the configured cap.
        stdout:       String,
        /// Captured stderr, truncated at the configured cap.
        stderr:       String,
        /// The process's exit code.
        exit_code:    i32,
        /// Wall-clock seconds the program ran for.
        elapsed_secs: f64,
        /// True when either stream was cut off at the cap.
        truncated:    bool,
    },
    /// The wall-clock budget was exceeded; the process tree was killed.
    TimedOut {
        /// Partial stdout captured before the kill.
        stdout:       String,
        /// Partial stderr captured before the kill.
        stderr:       String,
        /// Wall-clock seconds elapsed when the deadline fired.
        elapsed_secs: f64,
    },
    /// The process died abnormally (signal / unhandled runtime fault).
    Crashed {
        /// Output captured up to the fault.
        stdout:       String,
        /// Stderr captured up to the fault, usually the stack trace.
        stderr:       String,
        /// The terminating signal, where the platform reports one.
        signal:       Option<i32>,
        /// Wall-clock seconds until the fault.
        elapsed_secs: f64,
    },
}

impl ExecutionResult {
    /// The stdout captured for this execution, whatever its outcome.
    pub fn stdout(&self) -> &str {
        match self {
            ExecutionResult::Completed { stdout, .. }
            | ExecutionResult::TimedOut { stdout, .. }
            | ExecutionResult::Crashed { stdout, .. } => stdout,
        }
    }
}

/// Extracts the terminating signal from an exit status, if any.
#[cfg(unix)]
fn termination_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

/// Extracts the terminating signal from an exit status, if any.
#[cfg(not(unix))]
fn termination_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// Runs the designated entry point as an isolated, time-bounded child process.
///
/// The child runs `java -cp <build_dir> <fqcn>` with `workdir` as its working
/// directory (so relative file paths inside the student program resolve to
/// the submission's own scratch space), no stdin, its own process group, and
/// stdout/stderr captured up to `output_cap` bytes each. On deadline the
/// whole process group is killed and whatever output was captured is kept
/// for diagnostics.
pub async fn run_entry_point(
    build_dir: &Path,
    fqcn: &str,
    workdir: &Path,
    run_timeout: Duration,
    output_cap: usize,
) -> Result<ExecutionResult> {
    let java = java_path()?;
    let args: Vec<OsString> = vec![
        OsString::from("-cp"),
        build_dir.as_os_str().to_owned(),
        OsString::from(fqcn),
    ];

    let outcome =
        process::run_collect(&java, &args, Some(workdir), Some(run_timeout), output_cap).await?;

    Ok(match outcome {
        RunOutcome::Exited(collected) => {
            let elapsed_secs = collected.elapsed.as_secs_f64();
            let stdout = collected.stdout.to_text();
            let stderr = collected.stderr.to_text();

            match collected.status.code() {
                Some(exit_code) => ExecutionResult::Completed {
                    stdout,
                    stderr,
                    exit_code,
                    elapsed_secs,
                    truncated: collected.stdout.truncated || collected.stderr.truncated,
                },
                None => ExecutionResult::Crashed {
                    stdout,
                    stderr,
                    signal: termination_signal(&collected.status),
                    elapsed_secs,
                },
            }
        }
        RunOutcome::DeadlineExceeded {
            stdout,
            stderr,
            elapsed,
        } => ExecutionResult::TimedOut {
            stdout:       stdout.to_text(),
            stderr:       stderr.to_text(),
            elapsed_secs: elapsed.as_secs_f64(),
        },
    })
}
