// tests/process_tasks.rs

//! Process-backed tasks go through the adapter, once per key, and their
//! failures are classified like in-process failures.

use std::sync::Arc;

use anyhow::anyhow;
use targetdag::dag::Scheduler;
use targetdag::errors::{TaskError, WorkError};
use targetdag::fs::mock::MockFileSystem;
use targetdag::fs::FileSystem;
use targetdag::task::TaskKey;
use targetdag_test_utils::builders::{new_log, StubBehaviour, StubTaskBuilder};
use targetdag_test_utils::fake_process::FakeProcessAdapter;
use targetdag_test_utils::init_tracing;

fn key(family: &'static str) -> TaskKey {
    TaskKey::new(family, Vec::new())
}

/// Handler that treats the last argv element as an output path and writes it
/// into the shared mock filesystem.
fn producing_handler(mock: Arc<MockFileSystem>) -> FakeProcessAdapter {
    FakeProcessAdapter::with_handler(move |argv| {
        let out = argv.last().expect("argv has an output path");
        mock.add_file(out, "artifact");
        Ok(())
    })
}

#[tokio::test]
async fn process_work_is_delegated_to_the_adapter() {
    init_tracing();
    let mock = Arc::new(MockFileSystem::new());
    let fs: Arc<dyn FileSystem> = mock.clone();
    let log = new_log();

    let argv = vec!["produce".to_string(), "/out/fetch".to_string()];
    let fetch = StubTaskBuilder::new("fetch", fs.clone(), log.clone())
        .target_path("/out/fetch")
        .behaviour(StubBehaviour::Process(argv.clone()))
        .build();

    let adapter = producing_handler(mock.clone());
    let report = Scheduler::new(adapter.clone()).run(vec![fetch]).await.unwrap();

    assert!(report.is_success());
    assert_eq!(adapter.calls(), vec![argv]);
}

#[tokio::test]
async fn shared_process_task_is_invoked_once_for_two_dependents() {
    init_tracing();
    let mock = Arc::new(MockFileSystem::new());
    let fs: Arc<dyn FileSystem> = mock.clone();
    let log = new_log();

    let fetch = StubTaskBuilder::new("fetch", fs.clone(), log.clone())
        .target_path("/out/fetch")
        .behaviour(StubBehaviour::Process(vec![
            "produce".to_string(),
            "/out/fetch".to_string(),
        ]))
        .build();
    let left = StubTaskBuilder::new("left", fs.clone(), log.clone())
        .after(fetch.clone())
        .build();
    let right = StubTaskBuilder::new("right", fs.clone(), log.clone())
        .after(fetch.clone())
        .build();

    let adapter = producing_handler(mock.clone());
    let report = Scheduler::new(adapter.clone())
        .run(vec![left, right])
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(adapter.calls().len(), 1);
}

#[tokio::test]
async fn nonzero_exit_text_surfaces_in_the_execution_error() {
    init_tracing();
    let mock = Arc::new(MockFileSystem::new());
    let fs: Arc<dyn FileSystem> = mock.clone();
    let log = new_log();

    let fetch = StubTaskBuilder::new("fetch", fs.clone(), log.clone())
        .target_path("/out/fetch")
        .behaviour(StubBehaviour::Process(vec![
            "produce".to_string(),
            "/out/fetch".to_string(),
        ]))
        .build();
    let dependent = StubTaskBuilder::new("dependent", fs.clone(), log.clone())
        .after(fetch.clone())
        .build();

    let adapter = FakeProcessAdapter::with_handler(|argv| {
        Err(WorkError::Execution(anyhow!(
            "process '{}' exited with code 6: could not resolve host",
            argv[0]
        )))
    });
    let report = Scheduler::new(adapter.clone())
        .run(vec![dependent])
        .await
        .unwrap();

    assert!(!report.is_success());
    match report.status_of(&key("fetch")) {
        Some(targetdag::dag::TaskStatus::Failed(TaskError::Execution { message })) => {
            assert!(message.contains("could not resolve host"));
            assert!(message.contains("code 6"));
        }
        other => panic!("unexpected status for 'fetch': {other:?}"),
    }
    match report.status_of(&key("dependent")) {
        Some(targetdag::dag::TaskStatus::Failed(TaskError::DependencyFailed { dependency })) => {
            assert_eq!(*dependency, key("fetch"));
        }
        other => panic!("unexpected status for 'dependent': {other:?}"),
    }
    // Exactly one invocation; the adapter never retries.
    assert_eq!(adapter.calls().len(), 1);
}

#[tokio::test]
async fn successful_process_without_artifact_fails_the_postcondition() {
    init_tracing();
    let mock = Arc::new(MockFileSystem::new());
    let fs: Arc<dyn FileSystem> = mock.clone();
    let log = new_log();

    let fetch = StubTaskBuilder::new("fetch", fs.clone(), log.clone())
        .target_path("/out/fetch")
        .behaviour(StubBehaviour::Process(vec![
            "produce".to_string(),
            "/out/fetch".to_string(),
        ]))
        .build();

    // Exit code zero, but nothing written.
    let adapter = FakeProcessAdapter::succeeding();
    let report = Scheduler::new(adapter).run(vec![fetch]).await.unwrap();

    assert!(!report.is_success());
    assert!(matches!(
        report.status_of(&key("fetch")),
        Some(targetdag::dag::TaskStatus::Failed(TaskError::Postcondition { .. }))
    ));
}
