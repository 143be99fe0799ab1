// src/pipeline/tasks.rs

//! The concrete task graph: fetch -> extract -> configure -> train /
//! baseline -> evaluate (gate) -> export.
//!
//! Each task resolves its own target from the layout and wires its work
//! routine out of the shared context. Fetch and extract are process-backed;
//! the rest run in-process against the model backend.

use std::io::Write as _;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::errors::WorkError;
use crate::fs::FileSystem;
use crate::pipeline::config::{DatasetSection, GeneratorConfig, ModelSection};
use crate::pipeline::contracts::{ModelBackend, TrainedModel};
use crate::pipeline::layout::PipelineLayout;
use crate::target::{CompositeTarget, DirTarget, FileTarget, Target};
use crate::task::{ParamValue, Task, TaskKey, Work};

/// Shared state every pipeline task hangs on to.
pub(crate) struct PipelineCtx<B: ModelBackend> {
    pub layout: PipelineLayout,
    pub fs: Arc<dyn FileSystem>,
    pub backend: Arc<B>,
    pub dataset: DatasetSection,
    pub model: ModelSection,
}

impl<B: ModelBackend> PipelineCtx<B> {
    fn dataset_params(&self) -> Vec<ParamValue> {
        vec![
            self.dataset.name.as_str().into(),
            self.dataset.version.into(),
        ]
    }

    fn model_params(&self) -> Vec<ParamValue> {
        vec![self.model.name.as_str().into(), self.model.version.into()]
    }
}

/// Baseline metric record, read back by the evaluation gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub metric: f64,
}

/// Report written by the evaluation gate when it passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub metric: f64,
    pub baseline: f64,
}

/// Manifest written next to an exported model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub model: String,
    pub version: u32,
    pub metric: f64,
}

fn write_json<T: Serialize>(target: &dyn Target, value: &T) -> Result<(), WorkError> {
    let bytes = serde_json::to_vec_pretty(value)
        .context("serializing record")
        .map_err(WorkError::Execution)?;
    let mut writer = target.open_write().map_err(WorkError::Execution)?;
    writer.write_all(&bytes)?;
    Ok(())
}

fn sh(script: String) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script]
}

/// Download the dataset archive.
pub struct FetchArchive<B: ModelBackend> {
    ctx: Arc<PipelineCtx<B>>,
}

impl<B: ModelBackend> FetchArchive<B> {
    pub(crate) fn new(ctx: Arc<PipelineCtx<B>>) -> Self {
        Self { ctx }
    }
}

impl<B: ModelBackend> Task for FetchArchive<B> {
    fn key(&self) -> TaskKey {
        TaskKey::new("fetch_archive", self.ctx.dataset_params())
    }

    fn target(&self) -> Arc<dyn Target> {
        Arc::new(FileTarget::new(
            Arc::clone(&self.ctx.fs),
            self.ctx.layout.archive(&self.ctx.dataset),
        ))
    }

    fn work(&self) -> Work {
        let archive = self.ctx.layout.archive(&self.ctx.dataset);
        Work::Process(vec![
            "curl".to_string(),
            "-fsSL".to_string(),
            "-o".to_string(),
            archive.to_string_lossy().into_owned(),
            self.ctx.dataset.url.clone(),
        ])
    }
}

/// Unpack the archive into the dataset directory.
///
/// Extracts into a staging directory and renames it onto the target, so a
/// half-finished extraction never shows up as a complete dataset.
pub struct ExtractDataset<B: ModelBackend> {
    ctx: Arc<PipelineCtx<B>>,
}

impl<B: ModelBackend> ExtractDataset<B> {
    pub(crate) fn new(ctx: Arc<PipelineCtx<B>>) -> Self {
        Self { ctx }
    }
}

impl<B: ModelBackend> Task for ExtractDataset<B> {
    fn key(&self) -> TaskKey {
        TaskKey::new("extract_dataset", self.ctx.dataset_params())
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        vec![Arc::new(FetchArchive::new(Arc::clone(&self.ctx)))]
    }

    fn target(&self) -> Arc<dyn Target> {
        Arc::new(DirTarget::new(
            Arc::clone(&self.ctx.fs),
            self.ctx.layout.dataset_dir(&self.ctx.dataset),
        ))
    }

    fn work(&self) -> Work {
        let archive = self.ctx.layout.archive(&self.ctx.dataset);
        let dir = self.ctx.layout.dataset_dir(&self.ctx.dataset);
        let staging = dir.with_file_name("data.partial");
        Work::Process(sh(format!(
            "rm -rf '{staging}' && mkdir -p '{staging}' && \
             tar -xzf '{archive}' -C '{staging}' --strip-components=1 && \
             mv '{staging}' '{dir}'",
            staging = staging.display(),
            archive = archive.display(),
            dir = dir.display(),
        )))
    }
}

/// Persist the data-generator configuration.
pub struct WriteGeneratorConfig<B: ModelBackend> {
    ctx: Arc<PipelineCtx<B>>,
}

impl<B: ModelBackend> WriteGeneratorConfig<B> {
    pub(crate) fn new(ctx: Arc<PipelineCtx<B>>) -> Self {
        Self { ctx }
    }
}

impl<B: ModelBackend> Task for WriteGeneratorConfig<B> {
    fn key(&self) -> TaskKey {
        TaskKey::new("generator_config", self.ctx.model_params())
    }

    fn target(&self) -> Arc<dyn Target> {
        Arc::new(FileTarget::new(
            Arc::clone(&self.ctx.fs),
            self.ctx.layout.generator_config(&self.ctx.model),
        ))
    }

    fn work(&self) -> Work {
        let target = self.target();
        let config = GeneratorConfig::from_model(&self.ctx.model);
        Work::Run(Box::new(move || {
            let rendered = toml::to_string_pretty(&config)
                .context("serializing generator config")
                .map_err(WorkError::Execution)?;
            let mut writer = target.open_write().map_err(WorkError::Execution)?;
            writer.write_all(rendered.as_bytes())?;
            Ok(())
        }))
    }
}

/// Train the model on the train subset and save it.
pub struct TrainModel<B: ModelBackend> {
    ctx: Arc<PipelineCtx<B>>,
}

impl<B: ModelBackend> TrainModel<B> {
    pub(crate) fn new(ctx: Arc<PipelineCtx<B>>) -> Self {
        Self { ctx }
    }
}

impl<B: ModelBackend> Task for TrainModel<B> {
    fn key(&self) -> TaskKey {
        let mut params = self.ctx.model_params();
        params.extend(self.ctx.dataset_params());
        TaskKey::new("train_model", params)
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        vec![
            Arc::new(ExtractDataset::new(Arc::clone(&self.ctx))),
            Arc::new(WriteGeneratorConfig::new(Arc::clone(&self.ctx))),
        ]
    }

    fn target(&self) -> Arc<dyn Target> {
        Arc::new(FileTarget::new(
            Arc::clone(&self.ctx.fs),
            self.ctx.layout.model_file(&self.ctx.model),
        ))
    }

    fn work(&self) -> Work {
        let ctx = Arc::clone(&self.ctx);
        Work::Run(Box::new(move || {
            let config_path = ctx.layout.generator_config(&ctx.model);
            let dataset_dir = ctx.layout.dataset_dir(&ctx.dataset);
            let model_file = ctx.layout.model_file(&ctx.model);

            let data =
                ctx.backend
                    .data_source(&config_path, &dataset_dir, &ctx.dataset.train_subset)?;
            let model = ctx
                .backend
                .train(ctx.model.input_shape(), ctx.model.classes, &data)?;
            model.save(&model_file)?;
            Ok(())
        }))
    }
}

/// Compute the baseline metric the trained model must beat.
pub struct ComputeBaseline<B: ModelBackend> {
    ctx: Arc<PipelineCtx<B>>,
}

impl<B: ModelBackend> ComputeBaseline<B> {
    pub(crate) fn new(ctx: Arc<PipelineCtx<B>>) -> Self {
        Self { ctx }
    }
}

impl<B: ModelBackend> Task for ComputeBaseline<B> {
    fn key(&self) -> TaskKey {
        TaskKey::new("baseline_metric", self.ctx.dataset_params())
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        vec![
            Arc::new(ExtractDataset::new(Arc::clone(&self.ctx))),
            Arc::new(WriteGeneratorConfig::new(Arc::clone(&self.ctx))),
        ]
    }

    fn target(&self) -> Arc<dyn Target> {
        Arc::new(FileTarget::new(
            Arc::clone(&self.ctx.fs),
            self.ctx.layout.baseline_file(&self.ctx.dataset),
        ))
    }

    fn work(&self) -> Work {
        let ctx = Arc::clone(&self.ctx);
        let target = self.target();
        Work::Run(Box::new(move || {
            let config_path = ctx.layout.generator_config(&ctx.model);
            let dataset_dir = ctx.layout.dataset_dir(&ctx.dataset);

            let data =
                ctx.backend
                    .data_source(&config_path, &dataset_dir, &ctx.dataset.test_subset)?;
            let metric = ctx.backend.baseline(&data)?;
            write_json(&*target, &BaselineRecord { metric })
        }))
    }
}

/// Evaluate the trained model and gate on the baseline.
///
/// The gate is strict: a metric equal to the baseline fails. On failure no
/// report is written, so dependents (export) never run.
pub struct EvaluateModel<B: ModelBackend> {
    ctx: Arc<PipelineCtx<B>>,
}

impl<B: ModelBackend> EvaluateModel<B> {
    pub(crate) fn new(ctx: Arc<PipelineCtx<B>>) -> Self {
        Self { ctx }
    }
}

impl<B: ModelBackend> Task for EvaluateModel<B> {
    fn key(&self) -> TaskKey {
        TaskKey::new("evaluate_model", self.ctx.model_params())
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        vec![
            Arc::new(TrainModel::new(Arc::clone(&self.ctx))),
            Arc::new(ComputeBaseline::new(Arc::clone(&self.ctx))),
        ]
    }

    fn target(&self) -> Arc<dyn Target> {
        Arc::new(FileTarget::new(
            Arc::clone(&self.ctx.fs),
            self.ctx.layout.evaluation_report(&self.ctx.model),
        ))
    }

    fn work(&self) -> Work {
        let ctx = Arc::clone(&self.ctx);
        let target = self.target();
        Work::Run(Box::new(move || {
            let config_path = ctx.layout.generator_config(&ctx.model);
            let dataset_dir = ctx.layout.dataset_dir(&ctx.dataset);
            let model_file = ctx.layout.model_file(&ctx.model);
            let baseline_file = ctx.layout.baseline_file(&ctx.dataset);

            let data =
                ctx.backend
                    .data_source(&config_path, &dataset_dir, &ctx.dataset.test_subset)?;
            let model = ctx.backend.load(&model_file)?;
            let metric = ctx.backend.evaluate(&model, &data)?;

            let raw = ctx
                .fs
                .read_to_string(&baseline_file)
                .context("reading baseline record")?;
            let baseline: BaselineRecord = serde_json::from_str(&raw)
                .context("parsing baseline record")
                .map_err(WorkError::Execution)?;

            if metric <= baseline.metric {
                return Err(WorkError::Gate {
                    metric,
                    baseline: baseline.metric,
                });
            }

            write_json(
                &*target,
                &EvaluationReport {
                    metric,
                    baseline: baseline.metric,
                },
            )
        }))
    }
}

/// Export the model into a serving-ready directory, with a manifest.
pub struct ExportModel<B: ModelBackend> {
    ctx: Arc<PipelineCtx<B>>,
}

impl<B: ModelBackend> ExportModel<B> {
    pub(crate) fn new(ctx: Arc<PipelineCtx<B>>) -> Self {
        Self { ctx }
    }
}

impl<B: ModelBackend> Task for ExportModel<B> {
    fn key(&self) -> TaskKey {
        TaskKey::new("export_model", self.ctx.model_params())
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        vec![
            Arc::new(TrainModel::new(Arc::clone(&self.ctx))),
            Arc::new(EvaluateModel::new(Arc::clone(&self.ctx))),
        ]
    }

    fn target(&self) -> Arc<dyn Target> {
        let fs = &self.ctx.fs;
        Arc::new(CompositeTarget::new(vec![
            Arc::new(FileTarget::new(
                Arc::clone(fs),
                self.ctx.layout.exported_model(&self.ctx.model),
            )),
            Arc::new(FileTarget::new(
                Arc::clone(fs),
                self.ctx.layout.export_manifest(&self.ctx.model),
            )),
        ]))
    }

    fn work(&self) -> Work {
        let ctx = Arc::clone(&self.ctx);
        Work::Run(Box::new(move || {
            let model_file = ctx.layout.model_file(&ctx.model);
            let export_dir = ctx.layout.export_dir(&ctx.model);
            let report_file = ctx.layout.evaluation_report(&ctx.model);
            let manifest_file = ctx.layout.export_manifest(&ctx.model);

            let model = ctx.backend.load(&model_file)?;
            ctx.backend.export(&model, &export_dir)?;

            let raw = ctx
                .fs
                .read_to_string(&report_file)
                .context("reading evaluation report")?;
            let report: EvaluationReport = serde_json::from_str(&raw)
                .context("parsing evaluation report")
                .map_err(WorkError::Execution)?;

            let manifest = ExportManifest {
                model: ctx.model.name.clone(),
                version: ctx.model.version,
                metric: report.metric,
            };
            let manifest_target = FileTarget::new(Arc::clone(&ctx.fs), manifest_file);
            write_json(&manifest_target, &manifest)
        }))
    }
}
