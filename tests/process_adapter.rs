// tests/process_adapter.rs

//! The real command adapter against real processes (via `sh`).

use std::sync::Arc;
use std::time::Duration;

use targetdag::dag::{Scheduler, TaskStatus};
use targetdag::errors::TaskError;
use targetdag::exec::CommandAdapter;
use targetdag::fs::{FileSystem, RealFileSystem};
use targetdag::task::TaskKey;
use targetdag_test_utils::builders::{new_log, StubBehaviour, StubTaskBuilder};
use targetdag_test_utils::init_tracing;

fn sh(script: String) -> StubBehaviour {
    StubBehaviour::Process(vec!["sh".to_string(), "-c".to_string(), script])
}

#[tokio::test]
async fn real_process_produces_the_target() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("artifact");
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let log = new_log();

    let task = StubTaskBuilder::new("touch", fs, log)
        .target_path(&out)
        .behaviour(sh(format!("echo done > '{}'", out.display())))
        .build();

    let report = Scheduler::new(CommandAdapter::new())
        .run(vec![task])
        .await
        .unwrap();

    assert!(report.is_success());
    assert!(out.is_file());
}

#[tokio::test]
async fn nonzero_exit_captures_stderr_and_code() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("artifact");
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let log = new_log();

    let task = StubTaskBuilder::new("broken", fs, log)
        .target_path(&out)
        .behaviour(sh("echo 'no space left' >&2; exit 3".to_string()))
        .build();

    let report = Scheduler::new(CommandAdapter::new())
        .run(vec![task])
        .await
        .unwrap();

    assert!(!report.is_success());
    match report.status_of(&TaskKey::new("broken", Vec::new())) {
        Some(TaskStatus::Failed(TaskError::Execution { message })) => {
            assert!(message.contains("code 3"), "message: {message}");
            assert!(message.contains("no space left"), "message: {message}");
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert!(!out.exists());
}

#[tokio::test]
async fn deadline_violation_is_an_execution_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("artifact");
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let log = new_log();

    let task = StubTaskBuilder::new("slow", fs, log)
        .target_path(&out)
        .behaviour(sh("sleep 5".to_string()))
        .build();

    let report = Scheduler::new(CommandAdapter::new())
        .with_deadline(Duration::from_millis(200))
        .run(vec![task])
        .await
        .unwrap();

    assert!(!report.is_success());
    match report.status_of(&TaskKey::new("slow", Vec::new())) {
        Some(TaskStatus::Failed(TaskError::Execution { message })) => {
            assert!(message.contains("deadline"), "message: {message}");
        }
        other => panic!("unexpected status: {other:?}"),
    }
}
