// src/lib.rs

pub mod cli;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod target;
pub mod task;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::info;

use crate::cli::CliArgs;
use crate::dag::{RunReport, Scheduler, TaskPlan, TaskStatus};
use crate::exec::CommandAdapter;
use crate::fs::RealFileSystem;
use crate::pipeline::config::load_and_validate;
use crate::pipeline::script::ScriptBackend;
use crate::pipeline::Pipeline;
use crate::task::Task;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - pipeline config loading
/// - the script backend
/// - root task selection
/// - scheduler / process adapter
pub async fn run(args: CliArgs) -> Result<()> {
    let mut file = load_and_validate(&args.config)?;

    if let Some(dir) = &args.data_dir {
        file.pipeline.data_root = PathBuf::from(dir);
    }

    let backend = match &file.backend {
        Some(section) => Arc::new(ScriptBackend::new(section.clone())),
        // A dry run never invokes the backend; empty commands are fine.
        None if args.dry_run => Arc::new(ScriptBackend::new(empty_backend_section())),
        None => bail!(
            "pipeline file '{}' has no [backend] section; \
             backend commands are required to execute the pipeline",
            args.config
        ),
    };

    let fs = Arc::new(RealFileSystem);
    let pipeline = Pipeline::new(&file, fs, backend);

    let root: Arc<dyn Task> = if args.no_export {
        pipeline.evaluate_model()
    } else {
        pipeline.export_model()
    };

    if args.dry_run {
        print_dry_run(&[Arc::clone(&root)])?;
        return Ok(());
    }

    info!(root = %root.key(), "starting pipeline run");

    let mut scheduler = Scheduler::new(CommandAdapter::new());
    if let Some(secs) = args.deadline_secs {
        scheduler = scheduler.with_deadline(Duration::from_secs(secs));
    }

    let report = scheduler.run(vec![root]).await?;
    print_report(&report);

    if !report.is_success() {
        bail!("pipeline run failed");
    }
    Ok(())
}

fn empty_backend_section() -> crate::pipeline::config::BackendSection {
    crate::pipeline::config::BackendSection {
        train: String::new(),
        evaluate: String::new(),
        baseline: String::new(),
        export: String::new(),
    }
}

/// Resolve the graph and print every reachable task in dependency order.
fn print_dry_run(roots: &[Arc<dyn Task>]) -> Result<()> {
    let plan = TaskPlan::build(roots)?;

    println!("targetdag dry-run ({} tasks):", plan.len());
    for node in plan.iter() {
        let marker = if node.complete { "complete" } else { "pending" };
        println!("  - {} [{marker}]", node.key);
        println!("      target: {}", node.locator.display());
        if !node.deps.is_empty() {
            let deps: Vec<String> = node.deps.iter().map(ToString::to_string).collect();
            println!("      after: {}", deps.join(", "));
        }
    }

    Ok(())
}

/// Print each visited task's final state, in terminal order.
fn print_report(report: &RunReport) {
    println!("run report ({} tasks):", report.len());
    for (key, status) in report.iter() {
        match status {
            TaskStatus::Complete { ran: true } => println!("  - {key}: done"),
            TaskStatus::Complete { ran: false } => println!("  - {key}: up to date"),
            TaskStatus::Failed(err) => println!("  - {key}: FAILED ({err})"),
        }
    }
}
