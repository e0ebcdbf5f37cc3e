// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Command-line arguments for `slurmdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "slurmdag",
    version,
    about = "Compile a task graph into chained Slurm submissions.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SLURMDAG_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Prune, plan and submit the workflow described by a config file.
    Submit(SubmitArgs),
    /// Run one packaged payload (invoked by the generated task files).
    Exec(ExecArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SubmitArgs {
    /// Path to the workflow file (TOML).
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Run directory for generated scripts, payloads and logs.
    ///
    /// Overrides `[config].directory`; a fresh temporary directory is used
    /// when neither is given.
    #[arg(long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Compute partition applied to every task.
    #[arg(long, value_name = "NAME")]
    pub partition: Option<String>,

    /// Conda environment activated for every task.
    ///
    /// Defaults to `CONDA_DEFAULT_ENV` for tasks that do not set one.
    #[arg(long, value_name = "ENV")]
    pub environment: Option<String>,

    /// Copy the job manifest into this directory after submission.
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Remove the generated scripts after submission.
    #[arg(long)]
    pub cleanup: bool,

    /// Print the plan without writing or submitting anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ExecArgs {
    /// Packaged payload to invoke.
    #[arg(value_name = "PAYLOAD")]
    pub payload: PathBuf,

    /// Array index for array tasks.
    #[arg(value_name = "INDEX")]
    pub index: Option<u32>,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exec_with_index() {
        let args = CliArgs::try_parse_from(["slurmdag", "exec", "/run/node2.payload", "3"]).unwrap();
        match args.command {
            Command::Exec(exec) => {
                assert_eq!(exec.payload, PathBuf::from("/run/node2.payload"));
                assert_eq!(exec.index, Some(3));
            }
            other => panic!("expected exec, got {other:?}"),
        }
    }

    #[test]
    fn parses_submit_overrides() {
        let args = CliArgs::try_parse_from([
            "slurmdag",
            "--log-level",
            "debug",
            "submit",
            "--partition",
            "gpu",
            "--cleanup",
        ])
        .unwrap();
        match args.command {
            Command::Submit(submit) => {
                assert_eq!(submit.config, PathBuf::from("Slurmdag.toml"));
                assert_eq!(submit.partition.as_deref(), Some("gpu"));
                assert!(submit.cleanup);
                assert!(!submit.dry_run);
            }
            other => panic!("expected submit, got {other:?}"),
        }
    }
}
