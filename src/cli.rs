// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `targetdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "targetdag",
    version,
    about = "Run a target-driven task pipeline: only work whose output is missing.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    ///
    /// Default: `Pipeline.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Pipeline.toml")]
    pub config: String,

    /// Override `[pipeline].data_root` from the config file.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<String>,

    /// Stop after the evaluation gate; don't export.
    #[arg(long)]
    pub no_export: bool,

    /// Bound each external process invocation by this many seconds.
    #[arg(long, value_name = "SECS")]
    pub deadline_secs: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TARGETDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve the graph and print what would run, without executing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
