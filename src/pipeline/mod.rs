// src/pipeline/mod.rs

//! Pipeline composition root.
//!
//! - [`config`] defines the TOML pipeline file and its validation.
//! - [`layout`] maps declared names/versions to artifact paths.
//! - [`contracts`] holds the opaque collaborator traits (model backend).
//! - [`script`] implements the contracts over user-configured commands.
//! - [`tasks`] wires the concrete task graph.

pub mod config;
pub mod contracts;
pub mod layout;
pub mod script;
pub mod tasks;

use std::sync::Arc;

use crate::fs::FileSystem;
use crate::pipeline::config::PipelineFile;
use crate::pipeline::contracts::ModelBackend;
use crate::pipeline::layout::PipelineLayout;
use crate::pipeline::tasks::{
    ComputeBaseline, EvaluateModel, ExportModel, ExtractDataset, FetchArchive, PipelineCtx,
    TrainModel, WriteGeneratorConfig,
};
use crate::task::Task;

/// A fully bound pipeline: configuration plus filesystem and backend.
///
/// Hands out root tasks for the scheduler; the task graph is constructed
/// lazily through `dependencies()` as the scheduler resolves it.
pub struct Pipeline<B: ModelBackend> {
    ctx: Arc<PipelineCtx<B>>,
}

impl<B: ModelBackend> Pipeline<B> {
    pub fn new(file: &PipelineFile, fs: Arc<dyn FileSystem>, backend: Arc<B>) -> Self {
        let ctx = PipelineCtx {
            layout: PipelineLayout::new(&file.pipeline.data_root),
            fs,
            backend,
            dataset: file.dataset.clone(),
            model: file.model.clone(),
        };
        Self { ctx: Arc::new(ctx) }
    }

    /// The full pipeline: everything up to and including the export.
    pub fn export_model(&self) -> Arc<dyn Task> {
        Arc::new(ExportModel::new(Arc::clone(&self.ctx)))
    }

    /// The pipeline up to the evaluation gate, without exporting.
    pub fn evaluate_model(&self) -> Arc<dyn Task> {
        Arc::new(EvaluateModel::new(Arc::clone(&self.ctx)))
    }

    pub fn train_model(&self) -> Arc<dyn Task> {
        Arc::new(TrainModel::new(Arc::clone(&self.ctx)))
    }

    pub fn compute_baseline(&self) -> Arc<dyn Task> {
        Arc::new(ComputeBaseline::new(Arc::clone(&self.ctx)))
    }

    pub fn extract_dataset(&self) -> Arc<dyn Task> {
        Arc::new(ExtractDataset::new(Arc::clone(&self.ctx)))
    }

    pub fn fetch_archive(&self) -> Arc<dyn Task> {
        Arc::new(FetchArchive::new(Arc::clone(&self.ctx)))
    }

    pub fn write_generator_config(&self) -> Arc<dyn Task> {
        Arc::new(WriteGeneratorConfig::new(Arc::clone(&self.ctx)))
    }
}
