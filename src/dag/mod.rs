// src/dag/mod.rs

//! Graph resolution and scheduling.
//!
//! - [`scheduler`] walks the task graph dependency-first, runs the work
//!   whose targets are missing, and records one outcome per task key.
//! - [`record`] defines the per-key lifecycle and the run report.
//! - [`plan`] materializes the reachable graph eagerly for dry-run output.

pub mod plan;
pub mod record;
pub mod scheduler;

pub use plan::{PlanNode, TaskPlan};
pub use record::{RunReport, TaskStatus};
pub use scheduler::Scheduler;
