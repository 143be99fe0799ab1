// src/dag/record.rs

//! Per-run execution records and the run report.

use crate::errors::TaskError;
use crate::task::TaskKey;

/// Per-key state within one run (internal to the scheduler).
///
/// Absence from the record map means the key has not been visited yet.
#[derive(Debug)]
pub(crate) enum ExecutionRecord {
    /// The key has been visited and its dependencies are being resolved, or
    /// its work is running. Seeing this again from below is a cycle.
    InProgress,
    /// Terminal state, success or failure.
    Done(TaskStatus),
}

/// Public, read-only view of a task's final state in a run.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    Complete { ran: bool },
    Failed(TaskError),
}

impl TaskStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Complete { .. })
    }

    /// True only for tasks whose work routine actually executed.
    pub fn ran(&self) -> bool {
        matches!(self, TaskStatus::Complete { ran: true })
    }
}

/// Final record of every visited task key, in the order tasks reached a
/// terminal state.
#[derive(Debug, Default)]
pub struct RunReport {
    entries: Vec<(TaskKey, TaskStatus)>,
}

impl RunReport {
    pub(crate) fn push(&mut self, key: TaskKey, status: TaskStatus) {
        self.entries.push((key, status));
    }

    /// Whether every visited task ended complete.
    pub fn is_success(&self) -> bool {
        self.entries.iter().all(|(_, s)| s.is_complete())
    }

    pub fn status_of(&self, key: &TaskKey) -> Option<&TaskStatus> {
        self.entries
            .iter()
            .find_map(|(k, s)| (k == key).then_some(s))
    }

    /// All entries in terminal order.
    pub fn iter(&self) -> impl Iterator<Item = (&TaskKey, &TaskStatus)> {
        self.entries.iter().map(|(k, s)| (k, s))
    }

    /// Keys whose work routine executed, in terminal order.
    pub fn executed(&self) -> Vec<&TaskKey> {
        self.entries
            .iter()
            .filter_map(|(k, s)| s.ran().then_some(k))
            .collect()
    }

    /// Keys skipped because their target already existed.
    pub fn skipped(&self) -> Vec<&TaskKey> {
        self.entries
            .iter()
            .filter_map(|(k, s)| matches!(s, TaskStatus::Complete { ran: false }).then_some(k))
            .collect()
    }

    /// Keys that ended failed, with their errors.
    pub fn failures(&self) -> Vec<(&TaskKey, &TaskError)> {
        self.entries
            .iter()
            .filter_map(|(k, s)| match s {
                TaskStatus::Failed(e) => Some((k, e)),
                TaskStatus::Complete { .. } => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
