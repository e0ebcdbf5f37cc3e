#![allow(dead_code)]

use slurmdag::config::{ConfigFile, RawConfigFile, TaskConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_partition(mut self, partition: &str) -> Self {
        self.config.config.partition = Some(partition.to_string());
        self
    }

    pub fn with_default_directive(mut self, key: &str, value: &str) -> Self {
        self.config
            .default
            .directives
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig::shell(cmd),
        }
    }

    pub fn handler(name: &str) -> Self {
        Self {
            task: TaskConfig::handler(name, toml::Table::new()),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn tasks(mut self, count: u32) -> Self {
        self.task.tasks = count;
        self
    }

    pub fn directive(mut self, key: &str, value: &str) -> Self {
        self.task.directives.insert(key.to_string(), value.to_string());
        self
    }

    pub fn environment(mut self, env: &str) -> Self {
        self.task
            .metadata
            .insert("environment".to_string(), env.to_string());
        self
    }

    pub fn creates(mut self, pattern: &str) -> Self {
        self.task.creates.push(pattern.to_string());
        self
    }

    pub fn arg(mut self, key: &str, value: toml::Value) -> Self {
        self.task.args.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
