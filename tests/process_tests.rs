#![cfg(unix)]

use std::{ffi::OsString, time::Duration};

use cohort::process::{RunOutcome, run_collect};
use tempfile::TempDir;

fn sh(script: &str) -> Vec<OsString> {
    vec![OsString::from("-c"), OsString::from(script)]
}

#[tokio::test]
async fn captures_both_streams_and_exit_status() {
    let outcome = run_collect(
        "/bin/sh",
        &sh("echo out; echo err 1>&2; exit 3"),
        None,
        Some(Duration::from_secs(5)),
        64 * 1024,
    )
    .await
    .expect("spawn should succeed");

    match outcome {
        RunOutcome::Exited(collected) => {
            assert_eq!(collected.status.code(), Some(3));
            assert_eq!(collected.stdout.to_text(), "out\n");
            assert_eq!(collected.stderr.to_text(), "err\n");
            assert!(!collected.stdout.truncated);
        }
        other => panic!("expected a normal exit, got {other:?}"),
    }
}

#[tokio::test]
async fn runs_in_the_requested_working_directory() {
    let dir = TempDir::new().expect("should create temp dir");
    std::fs::write(dir.path().join("marker.txt"), "present").expect("should write marker");

    let outcome = run_collect(
        "/bin/sh",
        &sh("cat marker.txt"),
        Some(dir.path()),
        Some(Duration::from_secs(5)),
        64 * 1024,
    )
    .await
    .expect("spawn should succeed");

    match outcome {
        RunOutcome::Exited(collected) => {
            assert!(collected.status.success());
            assert_eq!(collected.stdout.to_text(), "present");
        }
        other => panic!("expected a normal exit, got {other:?}"),
    }
}

#[tokio::test]
async fn deadline_kills_a_sleeping_process() {
    let start = std::time::Instant::now();
    let outcome = run_collect(
        "/bin/sh",
        &sh("echo before; sleep 30; echo after"),
        None,
        Some(Duration::from_millis(300)),
        64 * 1024,
    )
    .await
    .expect("spawn should succeed");

    match outcome {
        RunOutcome::DeadlineExceeded { stdout, .. } => {
            assert_eq!(stdout.to_text(), "before\n");
        }
        other => panic!("expected the deadline to fire, got {other:?}"),
    }
    // The deadline, not the 30s sleep, decides when this returns.
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn deadline_kills_spawned_descendants_too() {
    let start = std::time::Instant::now();
    let outcome = run_collect(
        "/bin/sh",
        &sh("sleep 30 & sleep 30"),
        None,
        Some(Duration::from_millis(300)),
        64 * 1024,
    )
    .await
    .expect("spawn should succeed");

    assert!(matches!(outcome, RunOutcome::DeadlineExceeded { .. }));
    // If the backgrounded sleep survived, the capture drain would hold the
    // pipe open well past the grace period.
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn lingering_descendant_does_not_block_a_normal_exit() {
    let start = std::time::Instant::now();
    // The backgrounded sleep inherits the stdout pipe and outlives the
    // leader, which exits cleanly within its budget.
    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        run_collect(
            "/bin/sh",
            &sh("echo hi; sleep 30 & exit 0"),
            None,
            Some(Duration::from_secs(1)),
            64 * 1024,
        ),
    )
    .await
    .expect("run_collect should return despite the lingering descendant")
    .expect("spawn should succeed");

    match outcome {
        RunOutcome::Exited(collected) => {
            assert!(collected.status.success());
            assert_eq!(collected.stdout.to_text(), "hi\n");
        }
        other => panic!("expected a normal exit, got {other:?}"),
    }
    assert!(start.elapsed() < Duration::from_secs(8));
}

#[tokio::test]
async fn output_past_the_cap_is_dropped_not_buffered() {
    let outcome = run_collect(
        "/bin/sh",
        &sh("yes x | head -c 100000"),
        None,
        Some(Duration::from_secs(10)),
        1024,
    )
    .await
    .expect("spawn should succeed");

    match outcome {
        RunOutcome::Exited(collected) => {
            assert_eq!(collected.stdout.data.len(), 1024);
            assert!(collected.stdout.truncated);
        }
        other => panic!("expected a normal exit, got {other:?}"),
    }
}
