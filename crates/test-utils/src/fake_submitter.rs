use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use slurmdag::emit::layout::MANIFEST_FILE;
use slurmdag::errors::Result;
use slurmdag::fs::FileSystem;
use slurmdag::fs::mock::MockFileSystem;
use slurmdag::submit::SubmitBackend;

/// First job id handed out by the fake scheduler.
pub const FIRST_JOB_ID: u32 = 1000;

/// A fake submission backend that:
/// - records the text of every master script it is asked to run
/// - writes a manifest with one fake job id per accepted `sbatch` line
/// - can reject the submission after a number of accepted jobs.
#[derive(Clone)]
pub struct FakeSubmitter {
    fs: MockFileSystem,
    scripts: Arc<Mutex<Vec<String>>>,
    exit_code: i32,
    accepted_before_failure: u32,
}

impl FakeSubmitter {
    pub fn new(fs: MockFileSystem) -> Self {
        Self {
            fs,
            scripts: Arc::new(Mutex::new(Vec::new())),
            exit_code: 0,
            accepted_before_failure: 0,
        }
    }

    /// Make the first submission fail with `code`.
    pub fn failing(self, code: i32) -> Self {
        self.failing_after(0, code)
    }

    /// Accept `accepted` jobs, then fail the next submission with `code`.
    pub fn failing_after(mut self, accepted: u32, code: i32) -> Self {
        self.exit_code = code;
        self.accepted_before_failure = accepted;
        self
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

impl SubmitBackend for FakeSubmitter {
    fn submit<'a>(
        &'a mut self,
        script: &'a Path,
        workdir: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            let text = self.fs.read_to_string(script)?;
            self.scripts.lock().unwrap().push(text.clone());

            let mut accepted = text.lines().filter(|l| l.contains("=$(")).count() as u32;
            if self.exit_code != 0 {
                accepted = accepted.min(self.accepted_before_failure);
            }

            let manifest: String = (0..accepted)
                .map(|i| format!("{}\n", FIRST_JOB_ID + i))
                .collect();
            self.fs
                .write(&workdir.join(MANIFEST_FILE), manifest.as_bytes())?;
            Ok(self.exit_code)
        })
    }
}
