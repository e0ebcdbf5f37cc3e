// src/submit/backend.rs

//! Pluggable submission backend.
//!
//! The driver hands the rendered master script to a `SubmitBackend` instead
//! of spawning `bash` itself, so tests can swap in a fake that records the
//! script and writes a manifest without a real scheduler.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use anyhow::Context;
use tokio::process::Command;
use tracing::info;

use crate::errors::Result;

/// Trait abstracting how the master script is executed.
pub trait SubmitBackend: Send {
    /// Run `script` with `workdir` as the working directory and return its
    /// exit code once every submission call in it has returned.
    fn submit<'a>(
        &'a mut self,
        script: &'a Path,
        workdir: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>>;
}

/// Runs the master script with `bash` and waits for it.
#[derive(Debug, Clone, Default)]
pub struct BashSubmitBackend;

impl SubmitBackend for BashSubmitBackend {
    fn submit<'a>(
        &'a mut self,
        script: &'a Path,
        workdir: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            info!(script = ?script, "running submission script");
            let status = Command::new("bash")
                .arg(script)
                .current_dir(workdir)
                .status()
                .await
                .with_context(|| format!("spawning bash for {:?}", script))?;
            Ok(status.code().unwrap_or(-1))
        })
    }
}
