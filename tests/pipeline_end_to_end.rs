// tests/pipeline_end_to_end.rs

//! The whole pipeline against the fake backend and in-memory filesystem.

mod common;

use std::path::Path;
use std::sync::Arc;

use targetdag::dag::{RunReport, Scheduler, TaskPlan};
use targetdag::fs::mock::MockFileSystem;
use targetdag::fs::FileSystem;
use targetdag::pipeline::tasks::ExportManifest;
use targetdag::pipeline::Pipeline;
use targetdag::task::TaskKey;
use targetdag_test_utils::fake_backend::FakeBackend;
use targetdag_test_utils::init_tracing;

fn position(report: &RunReport, key: &TaskKey) -> usize {
    report
        .iter()
        .position(|(k, _)| k == key)
        .unwrap_or_else(|| panic!("{key} not in report"))
}

#[tokio::test]
async fn full_run_executes_every_stage_in_dependency_order() {
    init_tracing();
    let mock = Arc::new(MockFileSystem::new());
    let fs: Arc<dyn FileSystem> = mock.clone();

    let backend = FakeBackend::new(fs.clone(), 0.92, 0.61);
    let pipeline = Pipeline::new(&common::pipeline_file(), fs.clone(), Arc::new(backend.clone()));
    let adapter = common::fetch_and_extract_adapter(mock.clone());

    let report = Scheduler::new(adapter.clone())
        .run(vec![pipeline.export_model()])
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.len(), 7);
    assert_eq!(report.executed().len(), 7);

    // Terminal order respects every dependency edge.
    let fetch = position(&report, &common::dataset_key("fetch_archive"));
    let extract = position(&report, &common::dataset_key("extract_dataset"));
    let config = position(&report, &common::model_key("generator_config"));
    let train = position(&report, &common::train_key());
    let baseline = position(&report, &common::dataset_key("baseline_metric"));
    let evaluate = position(&report, &common::model_key("evaluate_model"));
    let export = position(&report, &common::model_key("export_model"));

    assert!(fetch < extract);
    assert!(extract < train);
    assert!(config < train);
    assert!(extract < baseline);
    assert!(train < evaluate);
    assert!(baseline < evaluate);
    assert!(evaluate < export);

    // Two process invocations: curl then tar.
    let calls = adapter.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0][0], "curl");

    // Every artifact landed.
    for path in [
        common::ARCHIVE,
        common::GENERATOR_CONFIG,
        common::BASELINE,
        common::MODEL_FILE,
        common::EVALUATION,
        common::EXPORTED_MODEL,
        common::MANIFEST,
    ] {
        assert!(fs.is_file(Path::new(path)), "missing artifact: {path}");
    }
    assert!(fs.is_dir(Path::new(common::DATASET_DIR)));

    // The shared extract/config tasks ran once despite the diamond above
    // them (train and baseline both depend on both).
    let calls = backend.calls();
    assert_eq!(calls.train, 1);
    assert_eq!(calls.baseline, 1);
    assert_eq!(calls.evaluate, 1);
    assert_eq!(calls.export, 1);
    assert_eq!(calls.data_source, 3);

    let manifest: ExportManifest =
        serde_json::from_str(&fs.read_to_string(Path::new(common::MANIFEST)).unwrap()).unwrap();
    assert_eq!(manifest.model, "cnn");
    assert_eq!(manifest.version, 1);
    assert_eq!(manifest.metric, 0.92);
}

#[tokio::test]
async fn rerun_over_existing_artifacts_does_no_work() {
    init_tracing();
    let mock = Arc::new(MockFileSystem::new());
    let fs: Arc<dyn FileSystem> = mock.clone();

    let backend = FakeBackend::new(fs.clone(), 0.92, 0.61);
    let pipeline = Pipeline::new(&common::pipeline_file(), fs.clone(), Arc::new(backend));
    let adapter = common::fetch_and_extract_adapter(mock.clone());

    let first = Scheduler::new(adapter)
        .run(vec![pipeline.export_model()])
        .await
        .unwrap();
    assert!(first.is_success());

    // Fresh backend and adapter so any invocation would be visible.
    let backend = FakeBackend::new(fs.clone(), 0.92, 0.61);
    let pipeline = Pipeline::new(&common::pipeline_file(), fs.clone(), Arc::new(backend.clone()));
    let adapter = common::fetch_and_extract_adapter(mock.clone());

    let second = Scheduler::new(adapter.clone())
        .run(vec![pipeline.export_model()])
        .await
        .unwrap();

    assert!(second.is_success());
    assert_eq!(second.len(), 7);
    assert!(second.executed().is_empty());
    assert_eq!(second.skipped().len(), 7);
    assert!(adapter.calls().is_empty());
    assert_eq!(backend.calls(), Default::default());
}

#[test]
fn plan_lists_the_whole_graph_dependencies_first() {
    init_tracing();
    let mock = Arc::new(MockFileSystem::new());
    let fs: Arc<dyn FileSystem> = mock.clone();

    let backend = FakeBackend::new(fs.clone(), 0.92, 0.61);
    let pipeline = Pipeline::new(&common::pipeline_file(), fs.clone(), Arc::new(backend));

    let plan = TaskPlan::build(&[pipeline.export_model()]).unwrap();
    assert_eq!(plan.len(), 7);

    let order: Vec<TaskKey> = plan.iter().map(|n| n.key.clone()).collect();
    let pos = |key: &TaskKey| order.iter().position(|k| k == key).unwrap();

    assert!(pos(&common::dataset_key("fetch_archive")) < pos(&common::dataset_key("extract_dataset")));
    assert!(pos(&common::dataset_key("extract_dataset")) < pos(&common::train_key()));
    assert!(pos(&common::model_key("generator_config")) < pos(&common::train_key()));
    assert!(pos(&common::train_key()) < pos(&common::model_key("evaluate_model")));
    assert!(pos(&common::model_key("evaluate_model")) < pos(&common::model_key("export_model")));

    // Nothing is complete on an empty filesystem.
    assert!(plan.iter().all(|n| !n.complete));
}
