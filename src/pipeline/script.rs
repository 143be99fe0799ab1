// src/pipeline/script.rs

//! Script-backed model backend.
//!
//! Maps the [`ModelBackend`] contract onto user-configured shell commands
//! from the `[backend]` config section. Commands that produce a value
//! (evaluate, baseline) print the metric as the last line of stdout.
//!
//! Runs with `std::process::Command`: backend calls happen inside a task's
//! work routine, which the scheduler already executes on a blocking thread.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

use crate::pipeline::config::BackendSection;
use crate::pipeline::contracts::{ModelBackend, TrainedModel};

/// Data-source handle: just the resolved inputs, passed on to each command.
#[derive(Debug, Clone)]
pub struct ScriptData {
    config: PathBuf,
    dataset_dir: PathBuf,
    subset: String,
}

/// Model handle: the path where a command left the model artifact.
#[derive(Debug, Clone)]
pub struct ScriptModel {
    path: PathBuf,
}

impl TrainedModel for ScriptModel {
    fn save(&self, path: &Path) -> Result<()> {
        if self.path == path {
            return Ok(());
        }
        std::fs::rename(&self.path, path)
            .with_context(|| format!("moving model {:?} to {:?}", self.path, path))
    }
}

#[derive(Debug, Clone)]
pub struct ScriptBackend {
    commands: BackendSection,
}

impl ScriptBackend {
    pub fn new(commands: BackendSection) -> Self {
        Self { commands }
    }

    /// Run an expanded command line through `sh -c`, capturing both streams.
    fn run(&self, command: &str) -> Result<String> {
        debug!(cmd = %command, "running backend command");

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .with_context(|| format!("spawning backend command: {command}"))?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "backend command exited with code {code}: {}",
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run a command whose last stdout line is a metric value.
    fn run_metric(&self, command: &str) -> Result<f64> {
        let stdout = self.run(command)?;
        let last = stdout
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| anyhow!("backend command produced no output: {command}"))?;
        last.trim()
            .parse::<f64>()
            .with_context(|| format!("parsing metric from backend output '{last}'"))
    }
}

impl ModelBackend for ScriptBackend {
    type Data = ScriptData;
    type Model = ScriptModel;

    fn data_source(
        &self,
        config_path: &Path,
        dataset_dir: &Path,
        subset: &str,
    ) -> Result<ScriptData> {
        Ok(ScriptData {
            config: config_path.to_path_buf(),
            dataset_dir: dataset_dir.to_path_buf(),
            subset: subset.to_string(),
        })
    }

    fn train(&self, _input_shape: [u32; 3], _classes: u32, data: &ScriptData) -> Result<ScriptModel> {
        // Train into a staging path; `save` moves it onto the target, so a
        // command that dies halfway leaves no half-written target behind.
        let staging = data.config.with_file_name("model.bin.partial");
        let cmd = expand(
            &self.commands.train,
            &[
                ("{config}", &path_str(&data.config)),
                ("{data}", &path_str(&data.dataset_dir)),
                ("{subset}", &data.subset),
                ("{out}", &path_str(&staging)),
            ],
        );
        self.run(&cmd)?;
        if !staging.is_file() {
            bail!("train command did not produce {:?}", staging);
        }
        Ok(ScriptModel { path: staging })
    }

    fn load(&self, model_path: &Path) -> Result<ScriptModel> {
        if !model_path.is_file() {
            bail!("model file {:?} not found", model_path);
        }
        Ok(ScriptModel {
            path: model_path.to_path_buf(),
        })
    }

    fn evaluate(&self, model: &ScriptModel, data: &ScriptData) -> Result<f64> {
        let cmd = expand(
            &self.commands.evaluate,
            &[
                ("{model}", &path_str(&model.path)),
                ("{config}", &path_str(&data.config)),
                ("{data}", &path_str(&data.dataset_dir)),
                ("{subset}", &data.subset),
            ],
        );
        self.run_metric(&cmd)
    }

    fn baseline(&self, data: &ScriptData) -> Result<f64> {
        let cmd = expand(
            &self.commands.baseline,
            &[
                ("{config}", &path_str(&data.config)),
                ("{data}", &path_str(&data.dataset_dir)),
                ("{subset}", &data.subset),
            ],
        );
        self.run_metric(&cmd)
    }

    fn export(&self, model: &ScriptModel, export_dir: &Path) -> Result<()> {
        let cmd = expand(
            &self.commands.export,
            &[
                ("{model}", &path_str(&model.path)),
                ("{out}", &path_str(export_dir)),
            ],
        );
        self.run(&cmd).map(|_| ())
    }
}

fn expand(template: &str, replacements: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (placeholder, value) in replacements {
        out = out.replace(placeholder, value);
    }
    out
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
