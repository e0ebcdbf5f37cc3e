// src/dag/graph.rs

use std::collections::BTreeMap;

use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use tracing::debug;

use crate::dag::node::{Node, NodeSpec};
use crate::errors::{Result, SlurmdagError};
use crate::types::{is_valid_node_name, NodeId};

/// The task graph: owns every node and the dependency relation.
///
/// Edge direction is `dependency -> dependent`. The relation is kept acyclic
/// at all times: `add_edge` refuses any edge that would close a cycle.
///
/// A context is an explicit value; callers build one, hand it to the
/// planner, and may build another for a different workflow in the same
/// process.
#[derive(Debug, Clone, Default)]
pub struct Context {
    nodes: BTreeMap<NodeId, Node>,
    edges: DiGraphMap<NodeId, ()>,
    next_id: u32,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its freshly allocated id.
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<NodeId> {
        if !is_valid_node_name(&spec.name) {
            return Err(SlurmdagError::InvalidNode(format!(
                "invalid node name '{}' (expected [A-Za-z0-9][A-Za-z0-9_.-]*)",
                spec.name
            )));
        }
        if spec.task_count == 0 {
            return Err(SlurmdagError::InvalidNode(format!(
                "node '{}' must have a task count >= 1",
                spec.name
            )));
        }
        if let Some(key) = spec.directives.invalid_keys().next() {
            return Err(SlurmdagError::InvalidNode(format!(
                "node '{}' has directive '{key}'; only long options (`--name[=value]`) are supported",
                spec.name
            )));
        }
        for dep in &spec.dependencies {
            if !self.nodes.contains_key(dep) {
                return Err(SlurmdagError::MissingDependency(format!(
                    "node '{}' depends on unknown node {}",
                    spec.name, dep
                )));
            }
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;

        let node = Node::from_spec(id, spec);
        self.edges.add_node(id);
        // A brand-new node has no dependents, so these edges cannot close a cycle.
        for dep in &node.dependencies {
            self.edges.add_edge(*dep, id, ());
        }
        debug!(node = %id, name = %node.name, deps = node.dependencies.len(), "added node");
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Declare that `to` depends on `from`.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        for id in [from, to] {
            if !self.nodes.contains_key(&id) {
                return Err(SlurmdagError::MissingDependency(format!("unknown node {id}")));
            }
        }
        if from == to || has_path_connecting(&self.edges, to, from, None) {
            return Err(SlurmdagError::Cycle(format!(
                "edge {} -> {} would create a cycle through '{}'",
                self.display_name(from),
                self.display_name(to),
                self.display_name(to),
            )));
        }

        self.edges.add_edge(from, to, ());
        if let Some(node) = self.nodes.get_mut(&to) {
            node.dependencies.insert(from);
        }
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Direct dependencies of a node, in insertion order.
    pub fn dependencies_of(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&id)
            .map(|n| n.dependencies.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Direct dependents of a node, in insertion order.
    pub fn dependents_of(&self, id: NodeId) -> Vec<NodeId> {
        if !self.edges.contains_node(id) {
            return Vec::new();
        }
        let mut out: Vec<NodeId> = self
            .edges
            .neighbors_directed(id, Direction::Outgoing)
            .collect();
        out.sort();
        out
    }

    /// Nodes that can start immediately. Empty iff the context is empty.
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.dependencies.is_empty())
            .map(|n| n.id)
            .collect()
    }

    /// Look a node up by name (first match in insertion order).
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.values().find(|n| n.name == name).map(|n| n.id)
    }

    /// Build a context holding only the given nodes, with ids preserved.
    ///
    /// Dependencies on nodes outside `keep` are dropped.
    pub(crate) fn retain(&self, keep: impl Fn(&Node) -> bool) -> Context {
        let mut nodes = BTreeMap::new();
        let mut edges = DiGraphMap::new();

        for node in self.nodes.values().filter(|n| keep(n)) {
            nodes.insert(node.id, node.clone());
            edges.add_node(node.id);
        }
        for node in nodes.values_mut() {
            node.dependencies.retain(|dep| edges.contains_node(*dep));
        }
        for node in nodes.values() {
            for dep in &node.dependencies {
                edges.add_edge(*dep, node.id, ());
            }
        }

        Context {
            nodes,
            edges,
            next_id: self.next_id,
        }
    }

    fn display_name(&self, id: NodeId) -> String {
        self.nodes
            .get(&id)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}
