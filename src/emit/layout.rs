// src/emit/layout.rs

//! Where every generated artifact lives inside a run directory.

use std::path::{Path, PathBuf};

use crate::payload::PAYLOAD_EXT;
use crate::types::NodeId;

pub const TASKS_DIR: &str = "tasks";
pub const LOGGING_DIR: &str = "logging";
pub const TASK_FILE_EXT: &str = "sbatch";
pub const PIPELINE_FILE: &str = "pipeline.bash";
pub const MANIFEST_FILE: &str = "slurm_jobs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    /// `root` should already be absolute; every path rendered into the
    /// scripts is derived from it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join(TASKS_DIR)
    }

    pub fn logging_dir(&self) -> PathBuf {
        self.root.join(LOGGING_DIR)
    }

    pub fn task_file(&self, id: NodeId) -> PathBuf {
        self.tasks_dir().join(format!("{id}.{TASK_FILE_EXT}"))
    }

    pub fn payload_file(&self, id: NodeId) -> PathBuf {
        self.root.join(format!("{id}.{PAYLOAD_EXT}"))
    }

    pub fn pipeline(&self) -> PathBuf {
        self.root.join(PIPELINE_FILE)
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths() {
        let layout = RunLayout::new("/scratch/run");
        assert_eq!(
            layout.task_file(NodeId(3)),
            PathBuf::from("/scratch/run/tasks/node3.sbatch")
        );
        assert_eq!(
            layout.payload_file(NodeId(3)),
            PathBuf::from("/scratch/run/node3.payload")
        );
        assert_eq!(layout.pipeline(), PathBuf::from("/scratch/run/pipeline.bash"));
        assert_eq!(layout.manifest(), PathBuf::from("/scratch/run/slurm_jobs"));
    }
}
