// src/emit/pipeline.rs

//! Master submission script rendering.

use std::collections::BTreeMap;

use crate::emit::layout::RunLayout;
use crate::emit::shell_quote;
use crate::errors::{Result, SlurmdagError};
use crate::types::NodeId;

/// Submission variable of the node at `position` in the linear order.
pub fn variable_name(position: usize) -> String {
    format!("t{position}")
}

/// `--dependency=afterok:$tA:$tB` for the given dependencies, or `None` when
/// the node can start right away.
///
/// Every dependency must already have a position; since dependencies precede
/// their dependents in the linear order, a missing one means the order was
/// not built from this node set.
pub fn dependency_expression(
    node: NodeId,
    dependencies: impl IntoIterator<Item = NodeId>,
    positions: &BTreeMap<NodeId, usize>,
) -> Result<Option<String>> {
    let own = positions.get(&node).copied();
    let mut expr = String::from("--dependency=afterok");
    let mut any = false;

    for dep in dependencies {
        let pos = positions.get(&dep).copied().ok_or_else(|| {
            SlurmdagError::MissingDependency(format!(
                "{node} depends on {dep} which has no submission variable"
            ))
        })?;
        if own.is_some_and(|own| pos >= own) {
            return Err(SlurmdagError::Cycle(format!(
                "{node} would be submitted before its dependency {dep}"
            )));
        }
        expr.push_str(":$");
        expr.push_str(&variable_name(pos));
        any = true;
    }

    Ok(any.then_some(expr))
}

/// One `tN=$(sbatch ...)` line.
pub fn submission_line(
    variable: &str,
    sbatch: &str,
    dependency: Option<&str>,
    task_file: &str,
) -> String {
    match dependency {
        Some(dep) => format!("{variable}=$({sbatch} {dep} {})", shell_quote(task_file)),
        None => format!("{variable}=$({sbatch} {})", shell_quote(task_file)),
    }
}

/// Render the full master script from its per-node submission lines.
///
/// The manifest is truncated up front and each job id is appended as soon as
/// its submission returns, so when a later `sbatch` fails under `set -e` the
/// manifest still lists every job the scheduler already accepted.
pub fn render_pipeline(layout: &RunLayout, submission_lines: &[String], variables: &[String]) -> String {
    let manifest = shell_quote(&layout.manifest().to_string_lossy());
    let mut lines = vec![
        "#!/usr/bin/env bash".to_string(),
        "#".to_string(),
        "# Slurm submission script, generated by slurmdag.".to_string(),
        "#".to_string(),
        "set -e".to_string(),
        format!(
            "mkdir -p {}",
            shell_quote(&layout.logging_dir().to_string_lossy())
        ),
        format!(": > {manifest}"),
    ];
    for (line, variable) in submission_lines.iter().zip(variables) {
        lines.push(line.clone());
        lines.push(format!("printf '%s\\n' \"${variable}\" >> {manifest}"));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
