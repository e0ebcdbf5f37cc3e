// src/payload/package.rs

//! Packaging of a node's work unit into an on-disk payload.

use serde::{Deserialize, Serialize};

use crate::dag::Node;
use crate::errors::{Result, SlurmdagError};
use crate::payload::registry::HandlerRegistry;
use crate::payload::work::Work;
use crate::types::NodeId;

/// Current payload format version.
pub const PAYLOAD_FORMAT: u32 = 1;

/// File extension of packaged payloads.
pub const PAYLOAD_EXT: &str = "payload";

/// Everything the runner needs to invoke a node's work, and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub format: u32,
    pub node: NodeId,
    pub name: String,
    pub task_count: u32,
    pub work: Work,
}

impl Payload {
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let payload: Payload = toml::from_str(s)?;
        if payload.format != PAYLOAD_FORMAT {
            return Err(SlurmdagError::Runner(format!(
                "unsupported payload format {} (expected {})",
                payload.format, PAYLOAD_FORMAT
            )));
        }
        Ok(payload)
    }

    /// Check that `index` is a valid invocation index for this payload.
    pub fn check_index(&self, index: Option<u32>) -> Result<()> {
        match (self.task_count > 1, index) {
            (true, Some(i)) if i < self.task_count => Ok(()),
            (true, Some(i)) => Err(SlurmdagError::Runner(format!(
                "array index {i} out of range [0, {}) for '{}'",
                self.task_count, self.name
            ))),
            (true, None) => Err(SlurmdagError::Runner(format!(
                "'{}' is an array task of {} instances and needs an index",
                self.name, self.task_count
            ))),
            (false, Some(i)) => Err(SlurmdagError::Runner(format!(
                "'{}' is not an array task but got index {i}",
                self.name
            ))),
            (false, None) => Ok(()),
        }
    }
}

/// A payload together with its serialized form, ready to be written.
#[derive(Debug, Clone)]
pub struct PackagedWork {
    pub payload: Payload,
    pub bytes: Vec<u8>,
}

/// Turn a node's work into a relocatable payload.
///
/// Fails when the work could not be invoked by a separate runner process.
pub fn package(node: &Node, registry: &HandlerRegistry) -> Result<PackagedWork> {
    let fail = |reason: String| SlurmdagError::Packaging {
        node: format!("'{}' ({})", node.name, node.id),
        reason,
    };

    match &node.work {
        Work::Shell { cmd } if cmd.trim().is_empty() => {
            return Err(fail("shell command is empty".to_string()));
        }
        Work::Handler { name, .. } if !registry.contains(name) => {
            return Err(fail(format!("handler '{name}' is not registered")));
        }
        _ => {}
    }

    let payload = Payload {
        format: PAYLOAD_FORMAT,
        node: node.id,
        name: node.name.clone(),
        task_count: node.task_count,
        work: node.work.clone(),
    };
    let text = payload.to_toml().map_err(|e| fail(e.to_string()))?;

    Ok(PackagedWork {
        payload,
        bytes: text.into_bytes(),
    })
}
