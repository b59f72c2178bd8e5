#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::{OsStr, OsString},
    path::Path,
    process::Stdio,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use tokio::{
    io::AsyncReadExt,
    process::{Child, Command},
    time::timeout,
};

/// How long to wait for the capture tasks to drain after the child (and its
/// process group) has been killed.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Signals every process in the given group. The child is spawned as its own
/// group leader, so a negative pid reaches every descendant it spawned — and
/// the group can still be signalled after the leader itself has been reaped,
/// as long as descendants remain in it.
#[cfg(unix)]
fn kill_group(group: Option<u32>) {
    if let Some(pgid) = group {
        unsafe {
            libc::kill(-(pgid as i32), libc::SIGKILL);
        }
    }
}

/// Group signalling is unavailable on this platform.
#[cfg(not(unix))]
fn kill_group(_group: Option<u32>) {}

/// Kills the child's entire process group, falling back to killing just the
/// direct child where group signalling is unavailable.
fn kill_process_tree(child: &mut Child) {
    kill_group(child.id());
    let _ = child.start_kill();
}

/// Drop guard that terminates a spawned child's process tree if callers forget
/// to await it.
struct ChildDropGuard(Option<Child>);

impl ChildDropGuard {
    /// Wraps the provided child process with the drop guard.
    fn new(child: Child) -> Self {
        Self(Some(child))
    }

    /// Returns a mutable reference to the underlying child process.
    fn child_mut(&mut self) -> Result<&mut Child> {
        self.0
            .as_mut()
            .context("child process already taken from guard")
    }

    /// Prevents the guard from killing the process on drop.
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for ChildDropGuard {
    fn drop(&mut self) {
        if let Some(child) = self.0.as_mut() {
            kill_process_tree(child);
        }
    }
}

/// One captured output stream, cut off at the configured cap.
#[derive(Debug, Default)]
pub struct Captured {
    /// Bytes captured, at most `cap` of them.
    pub data:      Vec<u8>,
    /// True when the stream produced more than `cap` bytes.
    pub truncated: bool,
}

impl Captured {
    /// Renders the captured bytes as lossy UTF-8.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub struct Collected {
    /// Exit status returned by the process.
    pub status:  std::process::ExitStatus,
    /// Contents written to stdout.
    pub stdout:  Captured,
    /// Contents written to stderr.
    pub stderr:  Captured,
    /// Wall-clock time the process ran for.
    pub elapsed: Duration,
}

/// Outcome of running a subprocess under a wall-clock deadline.
#[derive(Debug)]
pub enum RunOutcome {
    /// The process exited on its own within the budget.
    Exited(Collected),
    /// The deadline fired; the process tree was killed. Output captured up to
    /// that point is retained for diagnostics.
    DeadlineExceeded {
        /// Partial stdout captured before the kill.
        stdout:  Captured,
        /// Partial stderr captured before the kill.
        stderr:  Captured,
        /// Wall-clock time elapsed when the deadline fired.
        elapsed: Duration,
    },
}

/// Reads a stream to the end, keeping at most `cap` bytes and draining the
/// rest so the child never blocks on a full pipe.
async fn drain_capped<R>(mut reader: R, cap: usize) -> Result<Captured>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut data = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut chunk)
            .await
            .context("failed to read child output")?;
        if n == 0 {
            break;
        }

        if data.len() < cap {
            let take = (cap - data.len()).min(n);
            data.extend_from_slice(&chunk[..take]);
            if take < n {
                truncated = true;
            }
        } else {
            truncated = true;
        }
    }

    Ok(Captured { data, truncated })
}

/// Joins a capture task, giving up after a short grace period in case a
/// stray descendant still holds the pipe open.
async fn join_capture(mut task: tokio::task::JoinHandle<Result<Captured>>) -> Result<Captured> {
    match timeout(DRAIN_GRACE, &mut task).await {
        Ok(joined) => joined.context("capture task join error")?,
        Err(_) => {
            task.abort();
            Ok(Captured {
                data:      Vec::new(),
                truncated: true,
            })
        }
    }
}

/// Spawns a command with no stdin, its own process group, and bounded capture
/// of stdout/stderr.
///
/// With a `deadline`, the whole process tree is killed once the budget is
/// exceeded and the partial output is returned; leaked descendants are treated
/// as a bug, not a degradation.
pub async fn run_collect(
    program: impl AsRef<OsStr>,
    args: &[OsString],
    cwd: Option<&Path>,
    deadline: Option<Duration>,
    cap: usize,
) -> Result<RunOutcome> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    #[cfg(unix)]
    cmd.process_group(0);

    let start = Instant::now();
    let mut guard = ChildDropGuard::new(cmd.spawn().context("failed to spawn process")?);
    // Saved up front: after wait() reaps the leader, the Child no longer
    // reports a pid, but the group may still hold live descendants.
    let group = guard.child_mut()?.id();

    let stdout = guard
        .child_mut()?
        .stdout
        .take()
        .context("missing stdout pipe")?;
    let stderr = guard
        .child_mut()?
        .stderr
        .take()
        .context("missing stderr pipe")?;

    let out_task = tokio::spawn(drain_capped(stdout, cap));
    let err_task = tokio::spawn(drain_capped(stderr, cap));

    let waited = match deadline {
        Some(limit) => match timeout(limit, guard.child_mut()?.wait()).await {
            Ok(result) => Some(result.context("failed to wait on process")?),
            Err(_) => None,
        },
        None => Some(
            guard
                .child_mut()?
                .wait()
                .await
                .context("failed to wait on process")?,
        ),
    };

    match waited {
        Some(status) => {
            // The leader exited, but a descendant it backgrounded can keep
            // the output pipes open indefinitely. Kill whatever is left in
            // the group and bound the drain, same as on the deadline path.
            kill_group(group);
            guard.disarm();
            let stdout = join_capture(out_task).await?;
            let stderr = join_capture(err_task).await?;
            Ok(RunOutcome::Exited(Collected {
                status,
                stdout,
                stderr,
                elapsed: start.elapsed(),
            }))
        }
        None => {
            let elapsed = start.elapsed();
            kill_process_tree(guard.child_mut()?);
            // Reap the direct child so it does not linger as a zombie.
            let _ = guard.child_mut()?.wait().await;
            guard.disarm();

            let stdout = join_capture(out_task).await?;
            let stderr = join_capture(err_task).await?;
            Ok(RunOutcome::DeadlineExceeded {
                stdout,
                stderr,
                elapsed,
            })
        }
    }
}
