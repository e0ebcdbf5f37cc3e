// src/dag/node.rs

//! Nodes of the task graph and their postconditions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::GlobBuilder;

use crate::fs::FileSystem;
use crate::payload::Work;
use crate::types::{Directives, NodeId};

/// Predicate telling whether a node's effect already durably exists.
#[derive(Clone)]
pub enum Postcondition {
    /// Every entry (a path or a glob) must match at least one existing path.
    /// Relative entries are resolved against the prune base directory.
    Exists(Vec<String>),
    /// Arbitrary caller-supplied check. Errors propagate out of pruning.
    Predicate(Arc<dyn Fn() -> Result<bool> + Send + Sync>),
}

impl fmt::Debug for Postcondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Postcondition::Exists(patterns) => f.debug_tuple("Exists").field(patterns).finish(),
            Postcondition::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl Postcondition {
    pub fn exists<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Postcondition::Exists(patterns.into_iter().map(Into::into).collect())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn() -> Result<bool> + Send + Sync + 'static,
    {
        Postcondition::Predicate(Arc::new(f))
    }

    pub fn evaluate(&self, fs: &dyn FileSystem, base: &Path) -> Result<bool> {
        match self {
            Postcondition::Predicate(check) => check(),
            Postcondition::Exists(patterns) => {
                for pattern in patterns {
                    if !pattern_matches_any(fs, base, pattern)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

fn pattern_matches_any(fs: &dyn FileSystem, base: &Path, pattern: &str) -> Result<bool> {
    let full = base.join(pattern);
    if !has_glob_meta(pattern) {
        return Ok(fs.exists(&full));
    }

    let full_str = full.to_string_lossy().replace('\\', "/");
    let matcher = GlobBuilder::new(&full_str)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?
        .compile_matcher();

    // Only walk below the part of the pattern that has no wildcards.
    let mut root = PathBuf::new();
    for component in full.components() {
        if let Component::Normal(part) = component {
            if has_glob_meta(&part.to_string_lossy()) {
                break;
            }
        }
        root.push(component);
    }
    if !fs.is_dir(&root) {
        return Ok(false);
    }

    let mut stack = vec![root];
    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            let path_str = path.to_string_lossy().replace('\\', "/");
            if matcher.is_match(&path_str) {
                return Ok(true);
            }
            if fs.is_dir(&path) {
                stack.push(path);
            }
        }
    }
    Ok(false)
}

/// Everything needed to add a node to a [`Context`](crate::dag::Context).
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub name: String,
    pub work: Work,
    pub dependencies: Vec<NodeId>,
    pub directives: Directives,
    pub metadata: BTreeMap<String, String>,
    pub task_count: u32,
    pub postcondition: Option<Postcondition>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>, work: Work) -> Self {
        Self {
            name: name.into(),
            work,
            dependencies: Vec::new(),
            directives: Directives::new(),
            metadata: BTreeMap::new(),
            task_count: 1,
            postcondition: None,
        }
    }

    pub fn after(mut self, dep: NodeId) -> Self {
        self.dependencies.push(dep);
        self
    }

    pub fn directive(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.directives.insert(key, value);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn tasks(mut self, task_count: u32) -> Self {
        self.task_count = task_count;
        self
    }

    pub fn postcondition(mut self, postcondition: Postcondition) -> Self {
        self.postcondition = Some(postcondition);
        self
    }
}

/// A node owned by a context.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub work: Work,
    pub dependencies: BTreeSet<NodeId>,
    pub directives: Directives,
    pub metadata: BTreeMap<String, String>,
    pub task_count: u32,
    pub postcondition: Option<Postcondition>,
}

impl Node {
    pub(crate) fn from_spec(id: NodeId, spec: NodeSpec) -> Self {
        Self {
            id,
            name: spec.name,
            work: spec.work,
            dependencies: spec.dependencies.into_iter().collect(),
            directives: spec.directives,
            metadata: spec.metadata,
            task_count: spec.task_count,
            postcondition: spec.postcondition,
        }
    }

    /// Array tasks run `task_count` instances, one per index.
    pub fn is_array(&self) -> bool {
        self.task_count > 1
    }
}
