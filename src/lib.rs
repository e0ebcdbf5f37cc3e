// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod emit;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod payload;
pub mod submit;
pub mod types;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, ExecArgs, SubmitArgs};
use crate::config::{build_context, config_root_dir, load_and_validate, ConfigFile};
use crate::emit::SubmissionPlan;
use crate::fs::RealFileSystem;
use crate::payload::{run_payload, HandlerRegistry};
use crate::submit::{submit, BashSubmitBackend, SubmitOptions, SubmitOutcome, DEFAULT_SBATCH};

/// High-level entry point used by `main.rs`. Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    match args.command {
        Command::Submit(submit_args) => run_submit(submit_args).await,
        Command::Exec(exec_args) => run_exec(exec_args).await,
    }
}

async fn run_submit(args: SubmitArgs) -> Result<i32> {
    let cfg = load_and_validate(&args.config)?;
    let ctx = build_context(&cfg)?;
    let options = submit_options(&args, &cfg);
    debug!(?options, "resolved submit options");

    let mut backend = BashSubmitBackend;
    let outcome = submit(
        &ctx,
        &options,
        &RealFileSystem,
        &mut backend,
        &HandlerRegistry::builtin(),
    )
    .await?;

    match outcome {
        SubmitOutcome::NothingToDo { .. } => {
            println!("nothing to do: every task's postcondition already holds");
        }
        SubmitOutcome::Planned(plan) => print_dry_run(&plan),
        SubmitOutcome::Submitted { plan, manifest } => {
            info!(manifest = ?manifest, jobs = plan.entries.len(), "submission complete");
            println!("{}", manifest.display());
        }
    }
    Ok(0)
}

async fn run_exec(args: ExecArgs) -> Result<i32> {
    let outcome = run_payload(
        &RealFileSystem,
        &args.payload,
        args.index,
        &HandlerRegistry::builtin(),
    )
    .await?;
    Ok(outcome.exit_code())
}

/// Merge CLI flags over the `[config]` section; flags win.
pub fn submit_options(args: &SubmitArgs, cfg: &ConfigFile) -> SubmitOptions {
    let section = cfg.config_section();
    let root = config_root_dir(&args.config);

    SubmitOptions {
        directory: args
            .directory
            .clone()
            .or_else(|| section.directory.as_ref().map(|d| root.join(d))),
        partition: args.partition.clone().or_else(|| section.partition.clone()),
        environment: args.environment.clone().or_else(|| section.environment.clone()),
        ambient_environment: None,
        store: args
            .store
            .clone()
            .or_else(|| section.store.as_ref().map(|s| root.join(s))),
        cleanup: args.cleanup || section.cleanup,
        dry_run: args.dry_run,
        runner: section.runner.clone(),
        sbatch: section
            .sbatch
            .clone()
            .unwrap_or_else(|| DEFAULT_SBATCH.to_string()),
        prune_root: Some(root),
    }
    .with_ambient_environment()
}

/// Dry-run output: every node with its directives and dependency, then the
/// master script.
fn print_dry_run(plan: &SubmissionPlan) {
    println!("slurmdag dry-run");
    println!("  directory = {}", plan.layout.root().display());
    println!();

    println!("tasks ({}):", plan.entries.len());
    for entry in &plan.entries {
        println!("  - {} ({}, ${})", entry.name, entry.node, entry.variable);
        if let Some(dep) = &entry.dependency {
            println!("      {dep}");
        }
        for line in &entry.directives {
            println!("      {line}");
        }
    }
    println!();
    println!("{}", plan.script);

    debug!("dry-run complete (nothing written)");
}
