// src/pipeline/config.rs

//! Pipeline configuration as read from a TOML file.
//!
//! ```toml
//! [pipeline]
//! data_root = "data"
//!
//! [dataset]
//! name = "flowers"
//! version = 1
//! url = "https://example.com/datasets/flowers.tar.gz"
//!
//! [model]
//! name = "small-cnn"
//! version = 1
//! classes = 5
//! image_size = [64, 64]
//!
//! [backend]
//! train = "python scripts/train.py --config {config} --data {data} --subset {subset} --out {out}"
//! evaluate = "python scripts/evaluate.py --model {model} --config {config} --data {data} --subset {subset}"
//! baseline = "python scripts/baseline.py --data {data} --subset {subset}"
//! export = "python scripts/export.py --model {model} --out {out}"
//! ```
//!
//! Loading is split the usual way: [`load_from_path`] only deserializes,
//! [`load_and_validate`] additionally runs semantic validation and is the
//! entry point the rest of the application uses.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};

/// Top-level pipeline configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineFile {
    #[serde(default)]
    pub pipeline: PipelineSection,
    pub dataset: DatasetSection,
    pub model: ModelSection,
    /// Commands for the script backend. Optional; required only when the
    /// binary actually executes the pipeline (not for `--dry-run`).
    #[serde(default)]
    pub backend: Option<BackendSection>,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Root directory for all artifacts.
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
        }
    }
}

/// `[dataset]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSection {
    pub name: String,
    pub version: u32,
    /// Where the dataset archive is fetched from.
    pub url: String,
    #[serde(default = "default_train_subset")]
    pub train_subset: String,
    #[serde(default = "default_test_subset")]
    pub test_subset: String,
}

fn default_train_subset() -> String {
    "train".to_string()
}

fn default_test_subset() -> String {
    "test".to_string()
}

/// `[model]` section.
///
/// The generator knobs (`image_size`, `channels`, `batch_size`, `shuffle`,
/// `augment`) are forwarded into the serialized [`GeneratorConfig`]; the
/// engine never interprets them.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSection {
    pub name: String,
    pub version: u32,
    /// Number of output classes.
    pub classes: u32,
    pub image_size: [u32; 2],
    #[serde(default = "default_channels")]
    pub channels: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "default_true")]
    pub shuffle: bool,
    #[serde(default)]
    pub augment: bool,
}

fn default_channels() -> u32 {
    3
}

fn default_batch_size() -> u32 {
    32
}

fn default_true() -> bool {
    true
}

impl ModelSection {
    /// Input shape as (height, width, channels).
    pub fn input_shape(&self) -> [u32; 3] {
        [self.image_size[0], self.image_size[1], self.channels]
    }
}

/// `[backend]` section: command templates for the script backend.
///
/// Placeholders: `{config}`, `{data}`, `{subset}`, `{model}`, `{out}`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSection {
    pub train: String,
    pub evaluate: String,
    pub baseline: String,
    pub export: String,
}

/// The opaque data-generator configuration blob.
///
/// Persisted as TOML by the generator-config task and reloaded by backends;
/// the engine only moves it around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub image_size: [u32; 2],
    pub channels: u32,
    pub batch_size: u32,
    pub shuffle: bool,
    pub augment: bool,
}

impl GeneratorConfig {
    pub fn from_model(m: &ModelSection) -> Self {
        Self {
            image_size: m.image_size,
            channels: m.channels,
            batch_size: m.batch_size,
            shuffle: m.shuffle,
            augment: m.augment,
        }
    }
}

/// Deserialize a pipeline file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let file: PipelineFile = toml::from_str(&contents)?;
    Ok(file)
}

/// Load a pipeline file and run semantic validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let file = load_from_path(path)?;
    validate(&file)?;
    Ok(file)
}

/// Semantic checks that deserialization cannot express.
pub fn validate(file: &PipelineFile) -> Result<()> {
    validate_name("dataset.name", &file.dataset.name)?;
    validate_name("model.name", &file.model.name)?;

    if file.dataset.version == 0 {
        return Err(EngineError::Configuration(
            "dataset.version must be >= 1 (got 0)".to_string(),
        ));
    }
    if file.model.version == 0 {
        return Err(EngineError::Configuration(
            "model.version must be >= 1 (got 0)".to_string(),
        ));
    }
    if file.dataset.url.trim().is_empty() {
        return Err(EngineError::Configuration(
            "dataset.url must not be empty".to_string(),
        ));
    }
    if file.model.classes < 2 {
        return Err(EngineError::Configuration(format!(
            "model.classes must be >= 2 (got {})",
            file.model.classes
        )));
    }
    if file.model.image_size.iter().any(|&d| d == 0) {
        return Err(EngineError::Configuration(format!(
            "model.image_size must be positive (got {:?})",
            file.model.image_size
        )));
    }

    Ok(())
}

fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(EngineError::Configuration(format!(
            "{field} must not be empty"
        )));
    }
    // Names become path components.
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(EngineError::Configuration(format!(
            "{field} must be a plain name, not a path (got '{value}')"
        )));
    }
    Ok(())
}
