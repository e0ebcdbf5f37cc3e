// src/emit/defaults.rs

//! Default directive injection.
//!
//! Defaults are applied to a per-run copy of each node ([`PlannedNode`]);
//! the `Context` itself is never modified, so planning the same context
//! twice yields the same result.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::dag::Node;
use crate::emit::layout::LOGGING_DIR;
use crate::types::{Directives, NodeId, ENVIRONMENT_KEY};

/// Run-wide settings that end up on every node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultPolicy {
    /// Compute partition forced onto every node.
    pub partition: Option<String>,
    /// Environment forced onto every node.
    pub environment: Option<String>,
    /// Environment inherited from the invoking shell; only fills nodes
    /// that do not name one themselves.
    pub ambient_environment: Option<String>,
}

/// A node as it will be submitted in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedNode {
    pub id: NodeId,
    pub name: String,
    pub task_count: u32,
    pub dependencies: BTreeSet<NodeId>,
    pub directives: Directives,
    pub metadata: BTreeMap<String, String>,
}

impl PlannedNode {
    pub fn environment(&self) -> Option<&str> {
        self.metadata.get(ENVIRONMENT_KEY).map(|s| s.as_str())
    }

    pub fn is_array(&self) -> bool {
        self.task_count > 1
    }
}

/// Log file template relative to the run directory.
///
/// `%j` is the job id; array jobs use `%A` (array job id) and `%a` (index)
/// so every instance gets its own file.
pub fn log_template(name: &str, task_count: u32) -> String {
    if task_count > 1 {
        format!("{LOGGING_DIR}/{name}-%A_%a.log")
    } else {
        format!("{LOGGING_DIR}/{name}-%j.log")
    }
}

pub fn apply_defaults(node: &Node, run_dir: &Path, policy: &DefaultPolicy) -> PlannedNode {
    let mut directives = node.directives.clone();
    directives.insert_default("job-name", node.name.clone());
    directives.insert_default("export", "ALL");
    // Job ids are captured from sbatch's stdout, so this one is not optional.
    directives.insert("parsable", "");
    directives.insert_default("requeue", "");
    directives.insert_default("output", log_template(&node.name, node.task_count));
    directives.insert_default("chdir", run_dir.to_string_lossy());
    if let Some(partition) = &policy.partition {
        directives.insert("partition", partition.clone());
    }

    let mut metadata = node.metadata.clone();
    match (&policy.environment, &policy.ambient_environment) {
        (Some(env), _) => {
            metadata.insert(ENVIRONMENT_KEY.to_string(), env.clone());
        }
        (None, Some(env)) => {
            metadata
                .entry(ENVIRONMENT_KEY.to_string())
                .or_insert_with(|| env.clone());
        }
        (None, None) => {}
    }

    PlannedNode {
        id: node.id,
        name: node.name.clone(),
        task_count: node.task_count,
        dependencies: node.dependencies.clone(),
        directives,
        metadata,
    }
}
