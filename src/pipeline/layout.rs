// src/pipeline/layout.rs

//! Versioned on-disk layout for pipeline artifacts.
//!
//! Every target path is parameterized by the declared name/version
//! parameters, so a run with different parameters produces distinct targets
//! and therefore distinct executions. That is the whole caching story:
//! nothing else persists between runs.

use std::path::{Path, PathBuf};

use crate::pipeline::config::{DatasetSection, ModelSection};

#[derive(Debug, Clone)]
pub struct PipelineLayout {
    data_root: PathBuf,
}

impl PipelineLayout {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    fn dataset_root(&self, ds: &DatasetSection) -> PathBuf {
        self.data_root
            .join("datasets")
            .join(&ds.name)
            .join(format!("v{}", ds.version))
    }

    fn model_root(&self, m: &ModelSection) -> PathBuf {
        self.data_root
            .join("models")
            .join(&m.name)
            .join(format!("v{}", m.version))
    }

    /// Downloaded dataset archive.
    pub fn archive(&self, ds: &DatasetSection) -> PathBuf {
        self.dataset_root(ds).join("archive.tar.gz")
    }

    /// Extracted dataset directory.
    pub fn dataset_dir(&self, ds: &DatasetSection) -> PathBuf {
        self.dataset_root(ds).join("data")
    }

    /// Baseline metric record for a dataset.
    pub fn baseline_file(&self, ds: &DatasetSection) -> PathBuf {
        self.dataset_root(ds).join("baseline.json")
    }

    /// Serialized data-generator configuration.
    pub fn generator_config(&self, m: &ModelSection) -> PathBuf {
        self.model_root(m).join("generator.toml")
    }

    /// Trained model artifact.
    pub fn model_file(&self, m: &ModelSection) -> PathBuf {
        self.model_root(m).join("model.bin")
    }

    /// Evaluation report written by the threshold gate.
    pub fn evaluation_report(&self, m: &ModelSection) -> PathBuf {
        self.model_root(m).join("evaluation.json")
    }

    /// Serving-ready export directory.
    pub fn export_dir(&self, m: &ModelSection) -> PathBuf {
        self.data_root
            .join("serving")
            .join(&m.name)
            .join(m.version.to_string())
    }

    /// Model artifact inside the export directory.
    pub fn exported_model(&self, m: &ModelSection) -> PathBuf {
        self.export_dir(m).join("model.bin")
    }

    /// Manifest written next to the exported model.
    pub fn export_manifest(&self, m: &ModelSection) -> PathBuf {
        self.export_dir(m).join("manifest.json")
    }
}
