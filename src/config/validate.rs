// src/config/validate.rs

//! Semantic checks that turn a [`RawConfigFile`] into a [`ConfigFile`].

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
use crate::errors::{Result, SlurmdagError};
use crate::types::{is_valid_directive_key, is_valid_node_name};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SlurmdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        if raw.task.is_empty() {
            return Err(invalid("workflow defines no [task.<name>] sections"));
        }
        check_section(&raw.config)?;
        check_directive_keys("[default]", raw.default.directives.keys())?;
        for (name, task) in &raw.task {
            check_task(name, task)?;
            check_directive_keys(&format!("task '{name}'"), task.directives.keys())?;
            for dep in &task.after {
                if dep == name {
                    return Err(invalid(format!("task '{name}' lists itself in `after`")));
                }
                if !raw.task.contains_key(dep) {
                    return Err(invalid(format!(
                        "task '{name}' waits on unknown task '{dep}'"
                    )));
                }
            }
        }
        check_acyclic(&raw)?;

        Ok(ConfigFile::new_unchecked(raw.config, raw.default, raw.task))
    }
}

fn invalid(msg: impl Into<String>) -> SlurmdagError {
    SlurmdagError::ConfigError(msg.into())
}

fn check_section(section: &ConfigSection) -> Result<()> {
    let commands = [("sbatch", &section.sbatch), ("runner", &section.runner)];
    for (key, value) in commands {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(invalid(format!("[config].{key} is set but empty")));
        }
    }
    Ok(())
}

fn check_directive_keys<'a>(owner: &str, keys: impl IntoIterator<Item = &'a String>) -> Result<()> {
    match keys.into_iter().find(|k| !is_valid_directive_key(k)) {
        Some(key) => Err(invalid(format!(
            "{owner} has directive '{key}'; use the long option name (e.g. `partition`, not `-p`)"
        ))),
        None => Ok(()),
    }
}

fn check_task(name: &str, task: &TaskConfig) -> Result<()> {
    if !is_valid_node_name(name) {
        return Err(invalid(format!(
            "task name '{name}' must start with a letter or digit and contain only \
             letters, digits, '_', '.' and '-'"
        )));
    }
    match (&task.cmd, &task.handler) {
        (Some(_), Some(_)) => Err(invalid(format!(
            "task '{name}' sets both `cmd` and `handler`"
        ))),
        (None, None) => Err(invalid(format!(
            "task '{name}' needs a `cmd` or a `handler`"
        ))),
        (Some(_), None) if !task.args.is_empty() => Err(invalid(format!(
            "task '{name}' has `args` without a `handler`"
        ))),
        _ if task.tasks == 0 => Err(invalid(format!(
            "task '{name}' has `tasks = 0`; at least one instance is required"
        ))),
        _ => Ok(()),
    }
}

/// Edges run from a dependency to the task listing it in `after`.
fn check_acyclic(cfg: &RawConfigFile) -> Result<()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for (name, task) in &cfg.task {
        graph.add_node(name.as_str());
        for dep in &task.after {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    toposort(&graph, None).map(drop).map_err(|cycle| {
        SlurmdagError::Cycle(format!(
            "task '{}' (transitively) depends on itself",
            cycle.node_id()
        ))
    })
}
