// src/dag/linearize.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::dag::graph::Context;
use crate::errors::{Result, SlurmdagError};
use crate::types::NodeId;

/// Dependency-respecting total order over the nodes of `ctx`.
///
/// Kahn's algorithm; among nodes whose dependencies are all emitted, the one
/// inserted first goes next, so the order is fully determined by the graph.
///
/// The context keeps itself acyclic, but pruning rebuilds contexts, so both
/// dangling references and leftover cycles are checked here again.
pub fn linearize(ctx: &Context) -> Result<Vec<NodeId>> {
    let mut in_degree: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();

    for node in ctx.nodes() {
        for dep in &node.dependencies {
            if !ctx.contains(*dep) {
                return Err(SlurmdagError::MissingDependency(format!(
                    "node '{}' depends on {} which is not part of the plan",
                    node.name, dep
                )));
            }
            dependents.entry(*dep).or_default().push(node.id);
        }
        in_degree.insert(node.id, node.dependencies.len());
    }

    let mut ready: BTreeSet<NodeId> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order = Vec::with_capacity(ctx.len());

    while let Some(id) = ready.pop_first() {
        order.push(id);
        for dependent in dependents.get(&id).into_iter().flatten() {
            if let Some(deg) = in_degree.get_mut(dependent) {
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if order.len() != ctx.len() {
        let stuck: Vec<String> = in_degree
            .iter()
            .filter(|(_, deg)| **deg > 0)
            .filter_map(|(id, _)| ctx.node(*id).map(|n| n.name.clone()))
            .collect();
        return Err(SlurmdagError::Cycle(format!(
            "cannot order nodes {stuck:?}"
        )));
    }

    Ok(order)
}

/// Position of each node in a linear order.
pub fn positions(order: &[NodeId]) -> BTreeMap<NodeId, usize> {
    order.iter().enumerate().map(|(i, id)| (*id, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::node::NodeSpec;
    use crate::payload::Work;

    fn spec(name: &str) -> NodeSpec {
        NodeSpec::new(name, Work::shell("true"))
    }

    #[test]
    fn chain_is_ordered() {
        let mut ctx = Context::new();
        let a = ctx.add_node(spec("a")).unwrap();
        let b = ctx.add_node(spec("b").after(a)).unwrap();
        assert_eq!(linearize(&ctx).unwrap(), vec![a, b]);
    }

    #[test]
    fn ties_follow_insertion_order() {
        let mut ctx = Context::new();
        let late = ctx.add_node(spec("late")).unwrap();
        let root = ctx.add_node(spec("root")).unwrap();
        let x = ctx.add_node(spec("x")).unwrap();
        // `late` now waits on `x`, which was inserted after `root`.
        ctx.add_edge(x, late).unwrap();
        let y = ctx.add_node(spec("y").after(root)).unwrap();

        assert_eq!(linearize(&ctx).unwrap(), vec![root, x, late, y]);
    }

    #[test]
    fn diamond() {
        let mut ctx = Context::new();
        let a = ctx.add_node(spec("a")).unwrap();
        let b = ctx.add_node(spec("b").after(a)).unwrap();
        let c = ctx.add_node(spec("c").after(a)).unwrap();
        let d = ctx.add_node(spec("d").after(b).after(c)).unwrap();

        let order = linearize(&ctx).unwrap();
        assert_eq!(order, vec![a, b, c, d]);
        let pos = positions(&order);
        assert!(pos[&a] < pos[&b] && pos[&c] < pos[&d]);
    }

    #[test]
    fn empty_context_yields_empty_order() {
        assert!(linearize(&Context::new()).unwrap().is_empty());
    }
}
