// src/emit/task_file.rs

//! Per-node sbatch file rendering.

use std::path::Path;

use crate::emit::defaults::PlannedNode;
use crate::emit::shell_quote;

/// Prefix of every scheduler directive line.
pub const DIRECTIVE_PREFIX: &str = "#SBATCH ";

/// Shell variable Slurm sets to the index of an array instance.
pub const ARRAY_INDEX_VAR: &str = "$SLURM_ARRAY_TASK_ID";

/// `#SBATCH` lines for a planned node, in directive order.
pub fn directive_lines(node: &PlannedNode) -> Vec<String> {
    let mut lines: Vec<String> = node
        .directives
        .iter()
        .map(|(key, value)| {
            if value.is_empty() {
                format!("{DIRECTIVE_PREFIX}--{key}")
            } else {
                format!("{DIRECTIVE_PREFIX}--{key}={value}")
            }
        })
        .collect();
    if node.is_array() {
        lines.push(format!("{DIRECTIVE_PREFIX}--array=0-{}", node.task_count - 1));
    }
    lines
}

/// Render the file submitted with `sbatch` for one node.
///
/// `runner` is the command prefix that executes a payload; the payload path
/// and, for array nodes, the array index are appended to it.
pub fn render_task_file(node: &PlannedNode, runner: &str, payload: &Path) -> String {
    let mut lines = vec![
        "#!/usr/bin/env bash".to_string(),
        "#".to_string(),
        format!("# Slurm arguments for '{}', generated by slurmdag.", node.name),
        "#".to_string(),
    ];
    lines.extend(directive_lines(node));

    if let Some(env) = node.environment() {
        lines.push("eval \"$(conda shell.bash hook)\"".to_string());
        lines.push(format!("conda activate {}", shell_quote(env)));
    }

    let mut invocation = format!("{runner} {}", shell_quote(&payload.to_string_lossy()));
    if node.is_array() {
        invocation.push(' ');
        invocation.push_str(ARRAY_INDEX_VAR);
    }
    lines.push(invocation);

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
