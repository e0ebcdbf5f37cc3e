// src/emit/mod.rs

//! Rendering of the submission plan.
//!
//! - [`layout`] names every artifact inside a run directory.
//! - [`defaults`] applies the default directive policy per run.
//! - [`task_file`] renders one sbatch file per node.
//! - [`pipeline`] renders the master script chaining the submissions.
//!
//! [`build_plan`] ties them together for a linearized context.

pub mod defaults;
pub mod layout;
pub mod pipeline;
pub mod task_file;

use std::path::PathBuf;

use crate::dag::{positions, Context};
use crate::errors::{Result, SlurmdagError};
use crate::types::NodeId;

pub use defaults::{apply_defaults, DefaultPolicy, PlannedNode};
pub use layout::RunLayout;

/// One node's share of the submission plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub node: NodeId,
    pub name: String,
    /// Submission variable (`t<position>`).
    pub variable: String,
    /// Rendered `#SBATCH` lines.
    pub directives: Vec<String>,
    /// `--dependency=afterok:...`, if the node waits on anything.
    pub dependency: Option<String>,
    pub task_file: PathBuf,
    pub task_file_text: String,
    pub payload_file: PathBuf,
}

/// The complete set of rendered artifacts for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPlan {
    pub layout: RunLayout,
    pub entries: Vec<PlanEntry>,
    pub script: String,
}

impl SubmissionPlan {
    pub fn entry(&self, node: NodeId) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.node == node)
    }
}

/// Commands the rendered scripts call out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commands {
    /// Prefix that runs a payload (`<runner> <payload> [index]`).
    pub runner: String,
    /// Scheduler submission command.
    pub sbatch: String,
}

/// Render the plan for `ctx` submitted in `order`.
pub fn build_plan(
    ctx: &Context,
    order: &[NodeId],
    layout: &RunLayout,
    policy: &DefaultPolicy,
    commands: &Commands,
) -> Result<SubmissionPlan> {
    let pos = positions(order);
    let mut entries = Vec::with_capacity(order.len());
    let mut submission_lines = Vec::with_capacity(order.len());
    let mut variables = Vec::with_capacity(order.len());

    for (i, id) in order.iter().enumerate() {
        let node = ctx.node(*id).ok_or_else(|| {
            SlurmdagError::MissingDependency(format!("{id} is in the order but not in the graph"))
        })?;
        let planned = apply_defaults(node, layout.root(), policy);

        let variable = pipeline::variable_name(i);
        let dependency =
            pipeline::dependency_expression(*id, planned.dependencies.iter().copied(), &pos)?;
        let task_file = layout.task_file(*id);
        let payload_file = layout.payload_file(*id);
        let task_file_text = task_file::render_task_file(&planned, &commands.runner, &payload_file);

        submission_lines.push(pipeline::submission_line(
            &variable,
            &commands.sbatch,
            dependency.as_deref(),
            &task_file.to_string_lossy(),
        ));
        variables.push(variable.clone());

        entries.push(PlanEntry {
            node: *id,
            name: planned.name.clone(),
            variable,
            directives: task_file::directive_lines(&planned),
            dependency,
            task_file,
            task_file_text,
            payload_file,
        });
    }

    let script = pipeline::render_pipeline(layout, &submission_lines, &variables);
    Ok(SubmissionPlan {
        layout: layout.clone(),
        entries,
        script,
    })
}

/// Quote `s` for a POSIX shell unless it only holds safe characters.
pub fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+=:,@%".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
