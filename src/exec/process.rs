// src/exec/process.rs

//! External process adapter.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::WorkError;

/// Trait abstracting how argument-vector work is executed.
///
/// Production code uses [`CommandAdapter`]; tests can provide their own
/// implementation that doesn't spawn real processes.
///
/// The adapter is stateless: at-most-once invocation per task is the
/// scheduler's responsibility, and the adapter must not add retries.
pub trait ProcessAdapter: Send {
    /// Run `argv[0]` with the remaining elements as arguments.
    ///
    /// A nonzero exit maps to [`WorkError::Execution`] carrying the captured
    /// stderr text. `deadline`, when given, bounds the whole invocation and
    /// maps a violation to [`WorkError::Execution`] as well.
    fn run(
        &self,
        argv: &[String],
        deadline: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = Result<(), WorkError>> + Send + '_>>;
}

/// Real adapter used in production, backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct CommandAdapter;

impl CommandAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessAdapter for CommandAdapter {
    fn run(
        &self,
        argv: &[String],
        deadline: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = Result<(), WorkError>> + Send + '_>> {
        let argv = argv.to_vec();

        Box::pin(async move {
            let (program, args) = argv
                .split_first()
                .ok_or_else(|| anyhow!("empty argument vector"))?;

            info!(cmd = %argv.join(" "), "starting task process");

            let mut cmd = Command::new(program);
            cmd.args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let output = cmd.output();
            let output = match deadline {
                Some(limit) => tokio::time::timeout(limit, output).await.map_err(|_| {
                    anyhow!("process '{program}' exceeded deadline of {limit:?}")
                })?,
                None => output.await,
            }
            .with_context(|| format!("spawning process '{program}'"))?;

            let code = output.status.code().unwrap_or(-1);
            debug!(
                program = %program,
                exit_code = code,
                success = output.status.success(),
                "task process exited"
            );

            if output.status.success() {
                Ok(())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stderr = stderr.trim();
                Err(WorkError::Execution(anyhow!(
                    "process '{program}' exited with code {code}: {stderr}"
                )))
            }
        })
    }
}
