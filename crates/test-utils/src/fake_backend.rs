use std::io::Read as _;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use targetdag::fs::FileSystem;
use targetdag::pipeline::contracts::{ModelBackend, TrainedModel};

/// Per-method invocation counters, shared between clones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendCalls {
    pub data_source: usize,
    pub train: usize,
    pub evaluate: usize,
    pub baseline: usize,
    pub export: usize,
}

/// In-memory model backend for pipeline tests.
///
/// Returns fixed metric values and writes tiny artifacts through the shared
/// filesystem, so a whole pipeline run can execute against a
/// `MockFileSystem` without touching disk.
#[derive(Clone)]
pub struct FakeBackend {
    fs: Arc<dyn FileSystem>,
    accuracy: f64,
    baseline: f64,
    calls: Arc<Mutex<BackendCalls>>,
}

impl FakeBackend {
    pub fn new(fs: Arc<dyn FileSystem>, accuracy: f64, baseline: f64) -> Self {
        Self {
            fs,
            accuracy,
            baseline,
            calls: Arc::new(Mutex::new(BackendCalls::default())),
        }
    }

    pub fn calls(&self) -> BackendCalls {
        *self.calls.lock().unwrap()
    }
}

/// Opaque data-source handle: the subset it was built for.
#[derive(Debug, Clone)]
pub struct FakeData {
    pub subset: String,
}

/// Model handle whose payload round-trips through the shared filesystem.
pub struct FakeModel {
    fs: Arc<dyn FileSystem>,
    payload: Vec<u8>,
}

impl TrainedModel for FakeModel {
    fn save(&self, path: &Path) -> Result<()> {
        self.fs.write(path, &self.payload)
    }
}

impl ModelBackend for FakeBackend {
    type Data = FakeData;
    type Model = FakeModel;

    fn data_source(
        &self,
        config_path: &Path,
        dataset_dir: &Path,
        subset: &str,
    ) -> Result<FakeData> {
        self.calls.lock().unwrap().data_source += 1;

        // The generator config and the extracted dataset must both be in
        // place; a real backend would fail the same way.
        self.fs
            .read_to_string(config_path)
            .context("reading generator config")?;
        if !self.fs.is_dir(dataset_dir) {
            bail!("dataset directory {:?} not found", dataset_dir);
        }

        Ok(FakeData {
            subset: subset.to_string(),
        })
    }

    fn train(&self, _input_shape: [u32; 3], _classes: u32, _data: &FakeData) -> Result<FakeModel> {
        self.calls.lock().unwrap().train += 1;
        Ok(FakeModel {
            fs: Arc::clone(&self.fs),
            payload: b"fake-model".to_vec(),
        })
    }

    fn load(&self, model_path: &Path) -> Result<FakeModel> {
        let mut payload = Vec::new();
        self.fs
            .open_read(model_path)
            .context("loading model")?
            .read_to_end(&mut payload)?;
        Ok(FakeModel {
            fs: Arc::clone(&self.fs),
            payload,
        })
    }

    fn evaluate(&self, _model: &FakeModel, _data: &FakeData) -> Result<f64> {
        self.calls.lock().unwrap().evaluate += 1;
        Ok(self.accuracy)
    }

    fn baseline(&self, _data: &FakeData) -> Result<f64> {
        self.calls.lock().unwrap().baseline += 1;
        Ok(self.baseline)
    }

    fn export(&self, model: &FakeModel, export_dir: &Path) -> Result<()> {
        self.calls.lock().unwrap().export += 1;
        self.fs
            .write(&export_dir.join("model.bin"), &model.payload)
    }
}
