#![allow(dead_code)]

//! Shared fixture for pipeline tests: a small config over an in-memory
//! filesystem, plus a process adapter that simulates fetch and extract.

use std::sync::Arc;

use targetdag::fs::mock::MockFileSystem;
use targetdag::pipeline::config::{
    DatasetSection, ModelSection, PipelineFile, PipelineSection,
};
use targetdag::task::{ParamValue, TaskKey};
use targetdag_test_utils::fake_process::FakeProcessAdapter;

pub const ARCHIVE: &str = "/data/datasets/flowers/v1/archive.tar.gz";
pub const DATASET_DIR: &str = "/data/datasets/flowers/v1/data";
pub const BASELINE: &str = "/data/datasets/flowers/v1/baseline.json";
pub const GENERATOR_CONFIG: &str = "/data/models/cnn/v1/generator.toml";
pub const MODEL_FILE: &str = "/data/models/cnn/v1/model.bin";
pub const EVALUATION: &str = "/data/models/cnn/v1/evaluation.json";
pub const EXPORTED_MODEL: &str = "/data/serving/cnn/1/model.bin";
pub const MANIFEST: &str = "/data/serving/cnn/1/manifest.json";

pub fn pipeline_file() -> PipelineFile {
    PipelineFile {
        pipeline: PipelineSection {
            data_root: "/data".into(),
        },
        dataset: DatasetSection {
            name: "flowers".to_string(),
            version: 1,
            url: "https://example.com/datasets/flowers.tar.gz".to_string(),
            train_subset: "train".to_string(),
            test_subset: "test".to_string(),
        },
        model: ModelSection {
            name: "cnn".to_string(),
            version: 1,
            classes: 5,
            image_size: [8, 8],
            channels: 3,
            batch_size: 4,
            shuffle: true,
            augment: false,
        },
        backend: None,
    }
}

/// Adapter standing in for the fetch (curl) and extract (tar) commands:
/// `curl` drops the archive at its `-o` path, anything else is the extract
/// script and produces the dataset directory.
pub fn fetch_and_extract_adapter(mock: Arc<MockFileSystem>) -> FakeProcessAdapter {
    FakeProcessAdapter::with_handler(move |argv| {
        if argv[0] == "curl" {
            let out = argv
                .iter()
                .skip_while(|a| a.as_str() != "-o")
                .nth(1)
                .expect("curl argv has -o <path>");
            mock.add_file(out, "archive-bytes");
        } else {
            mock.add_dir(DATASET_DIR);
        }
        Ok(())
    })
}

pub fn dataset_key(family: &'static str) -> TaskKey {
    TaskKey::new(family, vec![ParamValue::from("flowers"), ParamValue::from(1u32)])
}

pub fn model_key(family: &'static str) -> TaskKey {
    TaskKey::new(family, vec![ParamValue::from("cnn"), ParamValue::from(1u32)])
}

pub fn train_key() -> TaskKey {
    TaskKey::new(
        "train_model",
        vec![
            ParamValue::from("cnn"),
            ParamValue::from(1u32),
            ParamValue::from("flowers"),
            ParamValue::from(1u32),
        ],
    )
}
