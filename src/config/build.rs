// src/config/build.rs

//! Turning a validated workflow file into a task graph.

use std::collections::BTreeMap;

use crate::config::model::{ConfigFile, TaskConfig};
use crate::dag::{Context, NodeSpec, Postcondition};
use crate::errors::{Result, SlurmdagError};
use crate::payload::Work;
use crate::types::NodeId;

/// Build a [`Context`] from a validated workflow file.
///
/// Tasks are added in name order, so node ids (and therefore tie-breaking in
/// the submission order) follow the sorted task names. Relative `creates`
/// entries stay relative; the caller decides what they are resolved against.
pub fn build_context(cfg: &ConfigFile) -> Result<Context> {
    let mut ctx = Context::new();
    let mut ids: BTreeMap<&str, NodeId> = BTreeMap::new();
    let defaults = cfg.default_section();

    for (name, task) in cfg.tasks() {
        let mut spec = NodeSpec::new(name.clone(), work_of(task)).tasks(task.tasks);
        for (key, value) in &task.directives {
            spec.directives.insert(key.clone(), value.clone());
        }
        for (key, value) in &defaults.directives {
            spec.directives.insert_default(key.clone(), value.clone());
        }
        spec.metadata = defaults.metadata.clone();
        spec.metadata.extend(task.metadata.clone());
        if !task.creates.is_empty() {
            spec.postcondition = Some(Postcondition::exists(task.creates.iter().cloned()));
        }

        let id = ctx.add_node(spec)?;
        ids.insert(name.as_str(), id);
    }

    for (name, task) in cfg.tasks() {
        let to = ids[name.as_str()];
        for dep in &task.after {
            let from = *ids.get(dep.as_str()).ok_or_else(|| {
                SlurmdagError::MissingDependency(format!(
                    "task '{name}' depends on unknown task '{dep}'"
                ))
            })?;
            ctx.add_edge(from, to)?;
        }
    }

    Ok(ctx)
}

fn work_of(task: &TaskConfig) -> Work {
    match (&task.cmd, &task.handler) {
        (_, Some(handler)) => Work::handler(handler.clone(), task.args.clone()),
        (Some(cmd), None) => Work::shell(cmd.clone()),
        // Validation guarantees one of the two; an empty command fails packaging.
        (None, None) => Work::shell(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::RawConfigFile;

    #[test]
    fn builds_nodes_edges_and_defaults() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[default]
directives = { time = "01:00:00", mem = "1G" }
metadata = { environment = "base" }

[task.simulate]
cmd = "python simulate.py $1"
tasks = 4
creates = ["data/*.npy"]

[task.train]
handler = "touch"
args = { paths = ["model.txt"] }
after = ["simulate"]
directives = { mem = "8G", gres = "gpu:1" }
metadata = { environment = "torch" }
"#,
        )
        .unwrap();
        let cfg = ConfigFile::try_from(raw).unwrap();

        let ctx = build_context(&cfg).unwrap();
        let sim = ctx.find("simulate").unwrap();
        let train = ctx.find("train").unwrap();
        let train_node = ctx.node(train).unwrap();
        let sim_node = ctx.node(sim).unwrap();

        assert_eq!(ctx.dependencies_of(train), vec![sim]);
        assert_eq!(sim_node.task_count, 4);
        assert!(sim_node.postcondition.is_some());
        assert_eq!(train_node.directives.get("mem"), Some("8G"));
        assert_eq!(train_node.directives.get("time"), Some("01:00:00"));
        assert_eq!(train_node.metadata.get("environment").map(String::as_str), Some("torch"));
        assert_eq!(sim_node.metadata.get("environment").map(String::as_str), Some("base"));
        assert!(matches!(&train_node.work, Work::Handler { name, .. } if name == "touch"));
    }
}
