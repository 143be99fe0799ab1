// src/exec/mod.rs

//! Process execution layer.
//!
//! Process-backed tasks don't run their work in-process; they hand the
//! scheduler an argument vector, and the scheduler delegates the invocation
//! to a [`ProcessAdapter`].
//!
//! - [`process`] defines the `ProcessAdapter` trait and the concrete
//!   `CommandAdapter` used in production; tests replace it with a fake
//!   implementation.

pub mod process;

pub use process::{CommandAdapter, ProcessAdapter};
