// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! Three layers, matching who reports what:
//! - [`WorkError`] is what a work routine (in-process or external) may
//!   signal while running.
//! - [`TaskError`] is the terminal failure the scheduler records for a
//!   single task, including failures the work routine never sees
//!   (postcondition violations, failed dependencies).
//! - [`EngineError`] aborts a whole run before or during resolution
//!   (bad configuration, a cycle in the graph).

use std::path::PathBuf;

use thiserror::Error;

use crate::task::TaskKey;

/// Failure signalled by a work routine.
#[derive(Error, Debug)]
pub enum WorkError {
    /// The work routine itself failed: payload error, IO, or a process
    /// that exited nonzero (carrying its captured stderr).
    #[error("{0}")]
    Execution(#[from] anyhow::Error),

    /// A threshold gate did not pass. Carries both compared values.
    #[error("metric {metric} did not strictly exceed baseline {baseline}")]
    Gate { metric: f64, baseline: f64 },
}

impl From<std::io::Error> for WorkError {
    fn from(err: std::io::Error) -> Self {
        WorkError::Execution(err.into())
    }
}

/// Terminal failure recorded for a single task within a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    /// The work routine failed, or the external process exited nonzero.
    #[error("execution failed: {message}")]
    Execution { message: String },

    /// Threshold gate failure: the computed metric did not strictly exceed
    /// the baseline read from a dependency's target.
    #[error("metric {metric} did not strictly exceed baseline {baseline}")]
    Gate { metric: f64, baseline: f64 },

    /// The work routine reported success but the task's target still does
    /// not exist.
    #[error("target '{locator}' still missing after work reported success")]
    Postcondition { locator: PathBuf },

    /// A dependency of this task ended failed; the task was never attempted.
    #[error("dependency '{dependency}' failed")]
    DependencyFailed { dependency: TaskKey },
}

impl From<WorkError> for TaskError {
    fn from(err: WorkError) -> Self {
        match err {
            // `{:#}` flattens the anyhow context chain into one line.
            WorkError::Execution(e) => TaskError::Execution {
                message: format!("{e:#}"),
            },
            WorkError::Gate { metric, baseline } => TaskError::Gate { metric, baseline },
        }
    }
}

/// Errors that abort an entire run.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A task key was revisited while still in progress. Names the chain
    /// of in-progress tasks ending at the repeated key.
    #[error("cycle detected in task graph: {chain}")]
    Cycle { chain: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
