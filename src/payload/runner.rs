// src/payload/runner.rs

//! The generic out-of-process runner: `slurmdag exec <payload> [index]`.

use std::path::Path;

use tracing::info;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::payload::package::Payload;
use crate::payload::registry::HandlerRegistry;
use crate::payload::work::TaskOutcome;

/// Load the payload at `path` and invoke it with `index`.
///
/// The index is validated against the payload's task count before anything
/// runs.
pub async fn run_payload(
    fs: &dyn FileSystem,
    path: &Path,
    index: Option<u32>,
    registry: &HandlerRegistry,
) -> Result<TaskOutcome> {
    let text = fs.read_to_string(path)?;
    let payload = Payload::from_toml(&text)?;
    payload.check_index(index)?;

    info!(
        node = %payload.node,
        name = %payload.name,
        ?index,
        work = %payload.work.describe(),
        "invoking payload"
    );

    let outcome = payload.work.invoke(index, registry).await?;
    info!(name = %payload.name, ?index, ?outcome, "payload finished");
    Ok(outcome)
}
