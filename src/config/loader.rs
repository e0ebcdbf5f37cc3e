// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Workflow file looked up in the working directory when `--config` is not
/// given.
pub const DEFAULT_CONFIG_FILE: &str = "Slurmdag.toml";

/// Parse workflow TOML without semantic checks.
pub fn parse_raw(text: &str) -> Result<RawConfigFile> {
    Ok(toml::from_str(text)?)
}

/// Read, parse and validate the workflow file at `path`.
///
/// Validation rejects unknown `after` targets, cycles and malformed task
/// definitions, so a returned [`ConfigFile`] always builds into a valid
/// task graph.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let cfg = ConfigFile::try_from(parse_raw(&text)?)?;
    debug!(config = ?path, tasks = cfg.tasks().len(), "loaded workflow file");
    Ok(cfg)
}

/// Directory relative paths in the workflow file are resolved against: the
/// file's own directory, or the working directory for a bare file name.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_dir_of_nested_and_bare_paths() {
        assert_eq!(
            config_root_dir(Path::new("flows/Slurmdag.toml")),
            PathBuf::from("flows")
        );
        assert_eq!(
            config_root_dir(Path::new(DEFAULT_CONFIG_FILE)),
            std::env::current_dir().unwrap()
        );
    }

    #[test]
    fn tasks_default_to_one_instance() {
        let raw = parse_raw("[task.a]\ncmd = \"true\"\n").unwrap();
        assert_eq!(raw.task["a"].tasks, 1);
        assert!(raw.task["a"].after.is_empty());
    }
}
