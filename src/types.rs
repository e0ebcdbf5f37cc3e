// src/types.rs

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Metadata key holding the conda environment activated before a node runs.
pub const ENVIRONMENT_KEY: &str = "environment";

/// Ambient variable consulted when no environment override is given.
pub const AMBIENT_ENVIRONMENT_VAR: &str = "CONDA_DEFAULT_ENV";

static NODE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("valid regex"));

static DIRECTIVE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("valid regex"));

/// Stable handle for a node, allocated by the `Context` when the node is added.
///
/// Handles are allocated in increasing order, so comparing two ids compares
/// their insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// Whether `name` can be used as a job name and inside log file names.
pub fn is_valid_node_name(name: &str) -> bool {
    NODE_NAME_RE.is_match(name)
}

/// Whether `key` names a long sbatch option (`mem`, `--cpus-per-task`).
///
/// Short options such as `-p` have no `--key=value` form and are rejected.
pub fn is_valid_directive_key(key: &str) -> bool {
    DIRECTIVE_KEY_RE.is_match(directive_key(key))
}

/// Ordered scheduler directives (`#SBATCH --key[=value]`).
///
/// Keys are stored without the leading `--`. Re-inserting a key replaces its
/// value in place, so the rendering order is the order keys were first set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    entries: Vec<(String, String)>,
}

impl Directives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any existing value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key: String = key.into();
        let key = directive_key(&key).to_string();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Set `key` only if it is not present yet.
    pub fn insert_default(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key: String = key.into();
        let key = directive_key(&key).to_string();
        if !self.contains(&key) {
            self.entries.push((key, value.into()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = directive_key(key);
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys that cannot be rendered as `#SBATCH --key[=value]`.
    pub fn invalid_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| !is_valid_directive_key(k))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Directives {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut directives = Directives::new();
        for (k, v) in iter {
            directives.insert(k, v);
        }
        directives
    }
}

// Callers may write either `partition` or `--partition`.
fn directive_key(key: &str) -> &str {
    key.strip_prefix("--").unwrap_or(key)
}
