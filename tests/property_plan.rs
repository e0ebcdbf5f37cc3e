// tests/property_plan.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use proptest::prelude::*;
use slurmdag::dag::{linearize, prune, Context, NodeSpec, Postcondition};
use slurmdag::emit::{build_plan, Commands, DefaultPolicy, RunLayout};
use slurmdag::fs::mock::MockFileSystem;
use slurmdag::payload::Work;
use slurmdag::types::NodeId;

/// A random DAG: node `i` may only depend on nodes `0..i`, and each node's
/// postcondition is either satisfied or not.
fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = (Context, BTreeSet<NodeId>)> {
    (1..=max_nodes).prop_flat_map(|n| {
        (
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), n),
            proptest::collection::vec(any::<bool>(), n),
            proptest::collection::vec(1u32..4, n),
        )
            .prop_map(move |(raw_deps, satisfied, counts)| {
                let mut ctx = Context::new();
                let mut ids = Vec::with_capacity(n);
                let mut done = BTreeSet::new();
                for i in 0..n {
                    let mut spec = NodeSpec::new(format!("task_{i}"), Work::shell("true"))
                        .tasks(counts[i]);
                    if i > 0 {
                        let deps: BTreeSet<usize> = raw_deps[i].iter().map(|d| d % i).collect();
                        for d in deps {
                            spec = spec.after(ids[d]);
                        }
                    }
                    let holds = satisfied[i];
                    spec = spec.postcondition(Postcondition::predicate(move || Ok(holds)));
                    let id = ctx.add_node(spec).expect("acyclic by construction");
                    if holds {
                        done.insert(id);
                    }
                    ids.push(id);
                }
                (ctx, done)
            })
    })
}

fn ids(ctx: &Context) -> Vec<NodeId> {
    ctx.ids().collect()
}

proptest! {
    #[test]
    fn prune_keeps_exactly_the_unsatisfied_nodes((ctx, done) in dag_strategy(12)) {
        let fs = MockFileSystem::new();
        let pruned = prune(&ctx, &fs, Path::new("/")).unwrap();

        let expected: Vec<NodeId> = ctx.ids().filter(|id| !done.contains(id)).collect();
        prop_assert_eq!(ids(&pruned), expected);

        let again = prune(&pruned, &fs, Path::new("/")).unwrap();
        prop_assert_eq!(ids(&again), ids(&pruned));

        for id in pruned.ids() {
            for dep in pruned.dependencies_of(id) {
                prop_assert!(pruned.contains(dep));
            }
        }
    }

    #[test]
    fn order_respects_every_edge((ctx, _) in dag_strategy(12)) {
        let order = linearize(&ctx).unwrap();
        prop_assert_eq!(order.len(), ctx.len());

        let pos: BTreeMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        for id in ctx.ids() {
            for dep in ctx.dependencies_of(id) {
                prop_assert!(pos[&dep] < pos[&id], "{} must precede {}", dep, id);
            }
        }
    }

    #[test]
    fn plan_variables_follow_the_order((ctx, _) in dag_strategy(12)) {
        let order = linearize(&ctx).unwrap();
        let commands = Commands {
            runner: "slurmdag exec".to_string(),
            sbatch: "sbatch".to_string(),
        };
        let plan = build_plan(
            &ctx,
            &order,
            &RunLayout::new("/run"),
            &DefaultPolicy::default(),
            &commands,
        )
        .unwrap();

        prop_assert_eq!(plan.entries.len(), order.len());
        for (i, entry) in plan.entries.iter().enumerate() {
            prop_assert_eq!(entry.node, order[i]);
            prop_assert_eq!(&entry.variable, &format!("t{i}"));

            let deps = ctx.dependencies_of(entry.node);
            match &entry.dependency {
                None => prop_assert!(deps.is_empty()),
                Some(expr) => {
                    let referenced: Vec<usize> = expr
                        .trim_start_matches("--dependency=afterok")
                        .split(":$t")
                        .filter(|s| !s.is_empty())
                        .map(|s| s.parse().unwrap())
                        .collect();
                    prop_assert_eq!(referenced.len(), deps.len());
                    prop_assert!(referenced.iter().all(|&p| p < i));
                }
            }

            let node = ctx.node(entry.node).unwrap();
            let has_array = entry.directives.iter().any(|l| l.starts_with("#SBATCH --array="));
            prop_assert_eq!(has_array, node.task_count > 1);
        }

        let submissions = plan.script.lines().filter(|l| l.contains("=$(sbatch")).count();
        prop_assert_eq!(submissions, order.len());
    }
}
