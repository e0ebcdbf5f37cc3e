// src/logging.rs

//! Logging setup on top of `tracing-subscriber`.
//!
//! The filter is picked from, in order: the `--log-level` flag, the
//! `SLURMDAG_LOG` variable (full `EnvFilter` syntax, e.g.
//! `slurmdag::submit=debug,info`), then `info`.
//!
//! Output goes to stderr. Inside a cluster job, stdout belongs to the work
//! unit and Slurm captures both into the per-job log file.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Environment variable holding the log filter.
pub const LOG_ENV_VAR: &str = "SLURMDAG_LOG";

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. Call once, before any logging.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = resolve_filter(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

fn resolve_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(directive_for(level));
    }
    env.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

fn directive_for(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
