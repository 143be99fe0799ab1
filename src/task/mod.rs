// src/task/mod.rs

//! The task contract consumed by the scheduler.
//!
//! A task exposes exactly three capabilities: its dependencies, its target,
//! and its work. Everything the work routine actually does (fetch, train,
//! compare, export) is opaque payload; the scheduler only observes whether
//! the routine signalled failure and whether the target exists afterwards.

use std::fmt;
use std::sync::Arc;

use crate::errors::WorkError;
use crate::target::Target;

pub mod key;

pub use key::{ParamValue, TaskKey};

/// Boxed in-process work routine.
///
/// Constructed fresh by each `work()` call; the scheduler invokes it at most
/// once per key per run, on a blocking thread.
pub type WorkFn = Box<dyn FnOnce() -> std::result::Result<(), WorkError> + Send>;

/// What a task's work consists of.
pub enum Work {
    /// In-process routine.
    Run(WorkFn),
    /// Argument vector for the external process adapter. Paths to dependency
    /// targets and to the task's own target are already resolved into it.
    Process(Vec<String>),
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Work::Run(_) => f.write_str("Work::Run(..)"),
            Work::Process(argv) => f.debug_tuple("Work::Process").field(argv).finish(),
        }
    }
}

/// A node in the task graph.
pub trait Task: Send + Sync {
    /// Canonical identity. Equal keys mean the same node, however often it
    /// is requested.
    fn key(&self) -> TaskKey;

    /// Direct dependencies, in declaration order. May construct further
    /// tasks recursively; the scheduler evaluates this once per key per run.
    fn dependencies(&self) -> Vec<Arc<dyn Task>> {
        Vec::new()
    }

    /// The task's completion marker. Must be a pure function of the task's
    /// parameters; computing it has no side effects.
    fn target(&self) -> Arc<dyn Target>;

    /// The work that must make [`Task::target`] exist.
    fn work(&self) -> Work;

    /// Whether the task's output is already present.
    fn is_complete(&self) -> bool {
        self.target().exists()
    }
}
