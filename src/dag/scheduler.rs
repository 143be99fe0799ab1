// src/dag/scheduler.rs

//! Graph resolution and execution.
//!
//! The scheduler walks the task graph depth-first, dependencies before
//! dependents. Per task key it keeps one [`ExecutionRecord`]:
//!
//! - a key seen `Complete` is never revisited or re-run;
//! - a key seen `InProgress` from below means the graph has a cycle, which
//!   aborts the run with the offending chain;
//! - a key whose target already exists is marked complete without work;
//! - otherwise the work routine runs (in-process on a blocking thread, or
//!   via the process adapter), and the target must exist afterwards.
//!
//! Failures propagate dependency-to-dependent only: a failed task marks its
//! dependents failed without attempting them, while sibling subtrees keep
//! running and report their own outcome. Nothing is retried.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::dag::record::{ExecutionRecord, RunReport, TaskStatus};
use crate::errors::{EngineError, Result, TaskError, WorkError};
use crate::exec::ProcessAdapter;
use crate::task::{Task, TaskKey, Work};

/// One-run scheduler.
///
/// `run` consumes the scheduler: execution records live exactly as long as
/// the run, so a later run starts from target existence alone.
#[derive(Debug)]
pub struct Scheduler<P: ProcessAdapter> {
    adapter: P,
    deadline: Option<Duration>,
    records: HashMap<TaskKey, ExecutionRecord>,
    report: RunReport,
}

impl<P: ProcessAdapter> Scheduler<P> {
    pub fn new(adapter: P) -> Self {
        Self {
            adapter,
            deadline: None,
            records: HashMap::new(),
            report: RunReport::default(),
        }
    }

    /// Bound every process-backed work invocation by `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Resolve and execute the graphs rooted at `roots`.
    ///
    /// Returns `Err` only for whole-run aborts (a cycle). Per-task failures
    /// are recorded in the report; the run as a whole failed when
    /// [`RunReport::is_success`] is false.
    pub async fn run(mut self, roots: Vec<Arc<dyn Task>>) -> Result<RunReport> {
        let mut chain = Vec::new();

        for root in roots {
            debug!(root = %root.key(), "resolving root task");
            self.visit(root, &mut chain).await?;
            debug_assert!(chain.is_empty());
        }

        info!(
            tasks = self.report.len(),
            executed = self.report.executed().len(),
            skipped = self.report.skipped().len(),
            failed = self.report.failures().len(),
            "run finished"
        );

        Ok(self.report)
    }

    /// Resolve one task: dependencies first, then its own target and work.
    ///
    /// Returns whether the task ended complete. `chain` holds the keys
    /// currently in progress, root-first, for cycle naming.
    fn visit<'a>(
        &'a mut self,
        task: Arc<dyn Task>,
        chain: &'a mut Vec<TaskKey>,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            let key = task.key();

            match self.records.get(&key) {
                Some(ExecutionRecord::Done(status)) => return Ok(status.is_complete()),
                Some(ExecutionRecord::InProgress) => {
                    return Err(EngineError::Cycle {
                        chain: format_cycle(chain, &key),
                    });
                }
                None => {}
            }

            self.records.insert(key.clone(), ExecutionRecord::InProgress);
            chain.push(key.clone());

            // Evaluated exactly once per key per run.
            let deps = task.dependencies();

            for dep in deps {
                let dep_key = dep.key();
                if !self.visit(dep, chain).await? {
                    chain.pop();
                    warn!(
                        task = %key,
                        dependency = %dep_key,
                        "dependency failed; task will not be attempted"
                    );
                    self.finish(
                        key,
                        TaskStatus::Failed(TaskError::DependencyFailed {
                            dependency: dep_key,
                        }),
                    );
                    return Ok(false);
                }
            }

            // All dependencies complete; nothing below can revisit this key.
            chain.pop();

            let target = task.target();

            if target.exists() {
                debug!(task = %key, locator = ?target.locator(), "target exists; skipping work");
                self.finish(key, TaskStatus::Complete { ran: false });
                return Ok(true);
            }

            if let Err(e) = target.ensure_parent_exists() {
                self.finish(
                    key,
                    TaskStatus::Failed(TaskError::Execution {
                        message: format!("{e:#}"),
                    }),
                );
                return Ok(false);
            }

            info!(task = %key, locator = ?target.locator(), "target missing; running work");

            let outcome = match task.work() {
                Work::Run(routine) => match tokio::task::spawn_blocking(routine).await {
                    Ok(result) => result,
                    Err(join_err) => Err(WorkError::Execution(anyhow::anyhow!(
                        "work routine panicked: {join_err}"
                    ))),
                },
                Work::Process(argv) => self.adapter.run(&argv, self.deadline).await,
            };

            let status = match outcome {
                Ok(()) => {
                    if target.exists() {
                        TaskStatus::Complete { ran: true }
                    } else {
                        TaskStatus::Failed(TaskError::Postcondition {
                            locator: target.locator().to_path_buf(),
                        })
                    }
                }
                Err(work_err) => TaskStatus::Failed(work_err.into()),
            };

            let completed = status.is_complete();
            if let TaskStatus::Failed(ref err) = status {
                warn!(task = %key, error = %err, "task failed");
            }
            self.finish(key, status);

            Ok(completed)
        })
    }

    fn finish(&mut self, key: TaskKey, status: TaskStatus) {
        self.records
            .insert(key.clone(), ExecutionRecord::Done(status.clone()));
        self.report.push(key, status);
    }
}

/// Format the in-progress chain from the first occurrence of the repeated
/// key, e.g. `a() -> b() -> a()`.
fn format_cycle(chain: &[TaskKey], repeated: &TaskKey) -> String {
    let start = chain.iter().position(|k| k == repeated).unwrap_or(0);
    let mut names: Vec<String> = chain[start..].iter().map(ToString::to_string).collect();
    names.push(repeated.to_string());
    names.join(" -> ")
}
