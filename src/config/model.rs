// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Top-level workflow file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// partition = "gpu"
///
/// [default]
/// directives = { time = "01:00:00" }
///
/// [task.simulate]
/// cmd = "python simulate.py --seed $1"
/// tasks = 4
/// creates = ["data/sim-*.npy"]
///
/// [task.train]
/// handler = "touch"
/// args = { paths = ["out/model.txt"] }
/// after = ["simulate"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub default: DefaultSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A workflow file that passed validation.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so holders can rely on known dependencies and an acyclic graph.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    default: DefaultSection,
    task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        default: DefaultSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            config,
            default,
            task,
        }
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn default_section(&self) -> &DefaultSection {
        &self.default
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }
}

/// `[config]` section: submission-run settings. Every field can be
/// overridden on the command line.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigSection {
    /// Run directory; a fresh temporary directory if unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Partition applied to every task.
    #[serde(default)]
    pub partition: Option<String>,

    /// Conda environment activated for every task.
    #[serde(default)]
    pub environment: Option<String>,

    /// Where to copy the job manifest after submission.
    #[serde(default)]
    pub store: Option<PathBuf>,

    /// Remove the generated scripts after submission.
    #[serde(default)]
    pub cleanup: bool,

    /// Submission command, `sbatch` by default.
    #[serde(default)]
    pub sbatch: Option<String>,

    /// Command prefix that runs a payload on the cluster.
    #[serde(default)]
    pub runner: Option<String>,
}

/// `[default]` section: directives and metadata every task inherits unless
/// it sets the same key itself.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct DefaultSection {
    #[serde(default)]
    pub directives: BTreeMap<String, String>,

    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaskConfig {
    /// Shell command; the array index is passed as `$1`.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Registered handler name (alternative to `cmd`).
    #[serde(default)]
    pub handler: Option<String>,

    /// Arguments handed to `handler`.
    #[serde(default)]
    pub args: toml::Table,

    /// Tasks that must succeed before this one starts.
    #[serde(default)]
    pub after: Vec<String>,

    /// Number of array instances.
    #[serde(default = "default_tasks")]
    pub tasks: u32,

    /// Scheduler directives (`mem = "8G"` renders `#SBATCH --mem=8G`).
    /// An empty value renders a bare flag.
    #[serde(default)]
    pub directives: BTreeMap<String, String>,

    /// Execution metadata, e.g. `environment`.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Paths or globs that exist once this task has run; when all of them
    /// match, the task is skipped.
    #[serde(default)]
    pub creates: Vec<String>,
}

fn default_tasks() -> u32 {
    1
}

impl TaskConfig {
    pub fn shell(cmd: impl Into<String>) -> Self {
        Self {
            cmd: Some(cmd.into()),
            handler: None,
            args: toml::Table::new(),
            after: Vec::new(),
            tasks: default_tasks(),
            directives: BTreeMap::new(),
            metadata: BTreeMap::new(),
            creates: Vec::new(),
        }
    }

    pub fn handler(name: impl Into<String>, args: toml::Table) -> Self {
        Self {
            cmd: None,
            handler: Some(name.into()),
            args,
            ..Self::shell("")
        }
    }
}
