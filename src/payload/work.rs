// src/payload/work.rs

//! Work units: what a node actually runs once the cluster starts its job.

use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{error, info};

use crate::errors::{Result, SlurmdagError};
use crate::payload::registry::HandlerRegistry;

/// Environment variable carrying the array index into shell work units.
pub const TASK_INDEX_VAR: &str = "SLURMDAG_TASK_INDEX";

/// Outcome of a work unit invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(i32),
}

impl TaskOutcome {
    /// Process exit code the runner reports for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            TaskOutcome::Success => 0,
            TaskOutcome::Failed(code) => code,
        }
    }
}

/// A relocatable unit of work.
///
/// Work never captures process memory: it is either a shell command or a
/// reference to a named handler plus its serialized arguments, so it can be
/// written to disk and invoked by a different process later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Work {
    /// Run `cmd` with `sh -c`; the array index (if any) is passed as `$1`.
    Shell { cmd: String },
    /// Call the handler registered under `name` with `args`.
    Handler {
        name: String,
        #[serde(default)]
        args: toml::Table,
    },
}

impl Work {
    pub fn shell(cmd: impl Into<String>) -> Self {
        Work::Shell { cmd: cmd.into() }
    }

    pub fn handler(name: impl Into<String>, args: toml::Table) -> Self {
        Work::Handler {
            name: name.into(),
            args,
        }
    }

    /// Short description for logs and dry-run output.
    pub fn describe(&self) -> String {
        match self {
            Work::Shell { cmd } => format!("shell: {cmd}"),
            Work::Handler { name, .. } => format!("handler: {name}"),
        }
    }

    /// Invoke the work unit in this process.
    pub async fn invoke(&self, index: Option<u32>, registry: &HandlerRegistry) -> Result<TaskOutcome> {
        match self {
            Work::Shell { cmd } => run_shell(cmd, index).await,
            Work::Handler { name, args } => {
                let handler = registry.get(name).ok_or_else(|| {
                    SlurmdagError::Runner(format!("no handler registered under '{name}'"))
                })?;
                match handler(args, index) {
                    Ok(()) => Ok(TaskOutcome::Success),
                    Err(err) => {
                        error!(handler = %name, ?index, error = %err, "handler failed");
                        Ok(TaskOutcome::Failed(1))
                    }
                }
            }
        }
    }
}

async fn run_shell(cmd: &str, index: Option<u32>) -> Result<TaskOutcome> {
    let mut command = Command::new("sh");
    command.arg("-c").arg(cmd).arg("slurmdag");
    if let Some(index) = index {
        command.arg(index.to_string());
        command.env(TASK_INDEX_VAR, index.to_string());
    }
    command
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    info!(cmd = %cmd, ?index, "running shell work unit");
    let status = command.status().await?;
    let code = status.code().unwrap_or(-1);

    Ok(if status.success() {
        TaskOutcome::Success
    } else {
        TaskOutcome::Failed(code)
    })
}
