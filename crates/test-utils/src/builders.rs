#![allow(dead_code)]

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use targetdag::errors::WorkError;
use targetdag::fs::FileSystem;
use targetdag::target::{FileTarget, Target};
use targetdag::task::{ParamValue, Task, TaskKey, Work};

/// Shared record of which work routines actually ran, in order.
pub type ExecutionLog = Arc<Mutex<Vec<TaskKey>>>;

pub fn new_log() -> ExecutionLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Snapshot of the log for assertions.
pub fn logged(log: &ExecutionLog) -> Vec<TaskKey> {
    log.lock().unwrap().clone()
}

/// What a stub task's work routine does when invoked.
#[derive(Debug, Clone)]
pub enum StubBehaviour {
    /// Write the target, return success.
    Succeed,
    /// Return success without writing the target (postcondition violation).
    SucceedWithoutTarget,
    /// Fail with an execution error.
    Fail(String),
    /// Fail with a gate error carrying both compared values.
    Gate { metric: f64, baseline: f64 },
    /// Hand the scheduler an argument vector instead of running in-process.
    Process(Vec<String>),
}

/// A configurable task over a shared filesystem, for scheduler tests.
pub struct StubTask {
    key: TaskKey,
    deps: Vec<Arc<dyn Task>>,
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    behaviour: StubBehaviour,
    log: ExecutionLog,
}

impl Task for StubTask {
    fn key(&self) -> TaskKey {
        self.key.clone()
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        self.deps.clone()
    }

    fn target(&self) -> Arc<dyn Target> {
        Arc::new(FileTarget::new(Arc::clone(&self.fs), self.path.clone()))
    }

    fn work(&self) -> Work {
        if let StubBehaviour::Process(argv) = &self.behaviour {
            return Work::Process(argv.clone());
        }

        let key = self.key.clone();
        let log = Arc::clone(&self.log);
        let target = FileTarget::new(Arc::clone(&self.fs), self.path.clone());
        let behaviour = self.behaviour.clone();

        Work::Run(Box::new(move || {
            log.lock().unwrap().push(key);
            match behaviour {
                StubBehaviour::Succeed => {
                    let mut writer = target.open_write().map_err(WorkError::Execution)?;
                    writer.write_all(b"done")?;
                    Ok(())
                }
                StubBehaviour::SucceedWithoutTarget => Ok(()),
                StubBehaviour::Fail(message) => Err(WorkError::Execution(anyhow!(message))),
                StubBehaviour::Gate { metric, baseline } => {
                    Err(WorkError::Gate { metric, baseline })
                }
                StubBehaviour::Process(_) => unreachable!("handled above"),
            }
        }))
    }
}

/// Builder for [`StubTask`] to simplify test setup.
pub struct StubTaskBuilder {
    family: &'static str,
    params: Vec<ParamValue>,
    deps: Vec<Arc<dyn Task>>,
    fs: Arc<dyn FileSystem>,
    path: Option<PathBuf>,
    behaviour: StubBehaviour,
    log: ExecutionLog,
}

impl StubTaskBuilder {
    pub fn new(family: &'static str, fs: Arc<dyn FileSystem>, log: ExecutionLog) -> Self {
        Self {
            family,
            params: Vec::new(),
            deps: Vec::new(),
            fs,
            path: None,
            behaviour: StubBehaviour::Succeed,
            log,
        }
    }

    pub fn param(mut self, value: impl Into<ParamValue>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn after(mut self, dep: Arc<dyn Task>) -> Self {
        self.deps.push(dep);
        self
    }

    pub fn target_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn behaviour(mut self, behaviour: StubBehaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn build(self) -> Arc<dyn Task> {
        let path = self
            .path
            .unwrap_or_else(|| PathBuf::from("/out").join(self.family));
        Arc::new(StubTask {
            key: TaskKey::new(self.family, self.params),
            deps: self.deps,
            fs: self.fs,
            path,
            behaviour: self.behaviour,
            log: self.log,
        })
    }
}

/// Task whose dependency is wired up after construction, so tests can build
/// graphs with cycles.
pub struct LinkedTask {
    key: TaskKey,
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    link: Mutex<Option<Arc<dyn Task>>>,
}

impl LinkedTask {
    pub fn new(family: &'static str, fs: Arc<dyn FileSystem>) -> Arc<Self> {
        Arc::new(Self {
            key: TaskKey::new(family, Vec::new()),
            fs,
            path: PathBuf::from("/out").join(family),
            link: Mutex::new(None),
        })
    }

    pub fn link_to(&self, other: Arc<dyn Task>) {
        *self.link.lock().unwrap() = Some(other);
    }
}

impl Task for LinkedTask {
    fn key(&self) -> TaskKey {
        self.key.clone()
    }

    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        self.link.lock().unwrap().iter().cloned().collect()
    }

    fn target(&self) -> Arc<dyn Target> {
        Arc::new(FileTarget::new(Arc::clone(&self.fs), self.path.clone()))
    }

    fn work(&self) -> Work {
        Work::Run(Box::new(|| Ok(())))
    }
}
