// src/pipeline/contracts.rs

//! Collaborator contracts consumed by pipeline tasks.
//!
//! Everything behind these traits is opaque payload: the engine never looks
//! inside a data source or a model, it only routes paths between tasks and
//! observes success or failure. Tests substitute a fake backend; production
//! uses [`super::script::ScriptBackend`].

use std::path::Path;

use anyhow::Result;

/// Handle to a trained model.
pub trait TrainedModel: Send {
    /// Persist the model at `path`. This is what makes the training task's
    /// target exist.
    fn save(&self, path: &Path) -> Result<()>;
}

/// Model backend: data-generator builder plus train/evaluate/export routines.
pub trait ModelBackend: Send + Sync + 'static {
    /// Opaque iterable-data-source handle.
    type Data: Send;
    type Model: TrainedModel;

    /// Build a data source for one subset of an extracted dataset, driven by
    /// a serialized generator configuration.
    fn data_source(&self, config_path: &Path, dataset_dir: &Path, subset: &str)
        -> Result<Self::Data>;

    /// Train a model on `data` given the input shape and class count.
    fn train(&self, input_shape: [u32; 3], classes: u32, data: &Self::Data)
        -> Result<Self::Model>;

    /// Reload a previously saved model.
    fn load(&self, model_path: &Path) -> Result<Self::Model>;

    /// Metric (e.g. accuracy) of `model` on `data`.
    fn evaluate(&self, model: &Self::Model, data: &Self::Data) -> Result<f64>;

    /// Baseline metric on `data`: the floor a trained model must strictly
    /// exceed to pass the evaluation gate.
    fn baseline(&self, data: &Self::Data) -> Result<f64>;

    /// Write a serving-ready artifact directory for `model` into
    /// `export_dir`, including the `model.bin` artifact itself.
    fn export(&self, model: &Self::Model, export_dir: &Path) -> Result<()>;
}
