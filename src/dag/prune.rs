// src/dag/prune.rs

//! Removal of nodes whose postcondition already holds.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info};

use crate::dag::graph::Context;
use crate::errors::{Result, SlurmdagError};
use crate::fs::FileSystem;
use crate::types::NodeId;

/// Return a copy of `ctx` without the nodes whose postcondition holds.
///
/// All postconditions are evaluated once, up front, before anything is
/// removed. Satisfied nodes are dropped from the node set and from every
/// remaining dependency set; their dependents keep their other dependencies
/// and become roots when none are left. Unreachable nodes are never removed
/// on structural grounds alone.
///
/// `base` is the directory relative `Postcondition::Exists` entries are
/// resolved against.
pub fn prune(ctx: &Context, fs: &dyn FileSystem, base: &Path) -> Result<Context> {
    let mut satisfied: BTreeSet<NodeId> = BTreeSet::new();

    for node in ctx.nodes() {
        let Some(postcondition) = &node.postcondition else {
            continue;
        };
        let holds = postcondition
            .evaluate(fs, base)
            .map_err(SlurmdagError::Postcondition)?;
        debug!(node = %node.id, name = %node.name, holds, "evaluated postcondition");
        if holds {
            satisfied.insert(node.id);
        }
    }

    if !satisfied.is_empty() {
        info!(
            pruned = satisfied.len(),
            remaining = ctx.len() - satisfied.len(),
            "pruned nodes whose postconditions already hold"
        );
    }

    Ok(ctx.retain(|node| !satisfied.contains(&node.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::node::{NodeSpec, Postcondition};
    use crate::fs::mock::MockFileSystem;
    use crate::payload::Work;

    fn spec(name: &str) -> NodeSpec {
        NodeSpec::new(name, Work::shell("true"))
    }

    #[test]
    fn satisfied_dependency_is_removed_from_dependents() {
        let fs = MockFileSystem::new();
        let mut ctx = Context::new();
        let a = ctx
            .add_node(spec("a").postcondition(Postcondition::predicate(|| Ok(true))))
            .unwrap();
        let b = ctx.add_node(spec("b").after(a)).unwrap();

        let pruned = prune(&ctx, &fs, Path::new("/")).unwrap();

        assert!(!pruned.contains(a));
        assert!(pruned.contains(b));
        assert!(pruned.dependencies_of(b).is_empty());
        assert_eq!(pruned.roots(), vec![b]);
        // The input context is untouched.
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn dependent_keeps_unsatisfied_dependencies() {
        let fs = MockFileSystem::new();
        fs.add_file("/out/a.txt", b"done");
        let mut ctx = Context::new();
        let a = ctx
            .add_node(spec("a").postcondition(Postcondition::exists(["out/a.txt"])))
            .unwrap();
        let b = ctx
            .add_node(spec("b").postcondition(Postcondition::exists(["out/b.txt"])))
            .unwrap();
        let c = ctx.add_node(spec("c").after(a).after(b)).unwrap();

        let pruned = prune(&ctx, &fs, Path::new("/")).unwrap();

        assert_eq!(pruned.ids().collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(pruned.dependencies_of(c), vec![b]);
    }

    #[test]
    fn all_satisfied_prunes_to_empty() {
        let fs = MockFileSystem::new();
        let mut ctx = Context::new();
        let a = ctx
            .add_node(spec("a").postcondition(Postcondition::predicate(|| Ok(true))))
            .unwrap();
        ctx.add_node(
            spec("b")
                .after(a)
                .postcondition(Postcondition::predicate(|| Ok(true))),
        )
        .unwrap();

        let pruned = prune(&ctx, &fs, Path::new("/")).unwrap();
        assert!(pruned.is_empty());
        assert!(pruned.roots().is_empty());
    }

    #[test]
    fn predicate_error_aborts_pruning() {
        let fs = MockFileSystem::new();
        let mut ctx = Context::new();
        ctx.add_node(
            spec("a").postcondition(Postcondition::predicate(|| Err(anyhow::anyhow!("boom")))),
        )
        .unwrap();

        let err = prune(&ctx, &fs, Path::new("/")).unwrap_err();
        assert!(matches!(err, SlurmdagError::Postcondition(_)));
    }

    #[test]
    fn unreachable_nodes_are_kept() {
        let fs = MockFileSystem::new();
        let mut ctx = Context::new();
        let a = ctx.add_node(spec("a")).unwrap();
        let lonely = ctx.add_node(spec("lonely")).unwrap();

        let pruned = prune(&ctx, &fs, Path::new("/")).unwrap();
        assert_eq!(pruned.roots(), vec![a, lonely]);
    }
}
