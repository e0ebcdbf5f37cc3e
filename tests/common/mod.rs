#![allow(dead_code)]

pub use slurmdag_test_utils::builders;
pub use slurmdag_test_utils::fake_submitter::{FakeSubmitter, FIRST_JOB_ID};
pub use slurmdag_test_utils::init_tracing;

use std::path::PathBuf;

use slurmdag::submit::SubmitOptions;

/// Options for a run in `/run` on a mock filesystem.
pub fn mock_options() -> SubmitOptions {
    SubmitOptions {
        directory: Some(PathBuf::from("/run")),
        runner: Some("slurmdag exec".to_string()),
        ..SubmitOptions::default()
    }
}
