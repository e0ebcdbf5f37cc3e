// src/submit/driver.rs

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::{debug, info, warn};

use crate::dag::{linearize, prune, Context};
use crate::emit::{build_plan, shell_quote, Commands, DefaultPolicy, RunLayout, SubmissionPlan};
use crate::errors::Result;
use crate::errors::SlurmdagError;
use crate::fs::FileSystem;
use crate::payload::{package, HandlerRegistry};
use crate::submit::backend::SubmitBackend;
use crate::types::AMBIENT_ENVIRONMENT_VAR;

/// Default scheduler submission command.
pub const DEFAULT_SBATCH: &str = "sbatch";

/// Parameters of one submission run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Run directory; a fresh temporary directory when `None`.
    pub directory: Option<PathBuf>,
    /// Partition forced onto every node.
    pub partition: Option<String>,
    /// Environment forced onto every node.
    pub environment: Option<String>,
    /// Environment inherited from the invoking shell (see
    /// [`SubmitOptions::with_ambient_environment`]).
    pub ambient_environment: Option<String>,
    /// Directory the job manifest is copied into after submission.
    pub store: Option<PathBuf>,
    /// Remove the master script and task files after submission.
    pub cleanup: bool,
    /// Render the plan but write and submit nothing.
    pub dry_run: bool,
    /// Command prefix that runs a payload; the current executable's `exec`
    /// subcommand when `None`.
    pub runner: Option<String>,
    pub sbatch: String,
    /// Directory relative `Exists` postconditions are resolved against;
    /// the run directory when `None`.
    pub prune_root: Option<PathBuf>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            directory: None,
            partition: None,
            environment: None,
            ambient_environment: None,
            store: None,
            cleanup: false,
            dry_run: false,
            runner: None,
            sbatch: DEFAULT_SBATCH.to_string(),
            prune_root: None,
        }
    }
}

impl SubmitOptions {
    /// Pick up the environment of the invoking shell (`CONDA_DEFAULT_ENV`).
    pub fn with_ambient_environment(mut self) -> Self {
        self.ambient_environment = std::env::var(AMBIENT_ENVIRONMENT_VAR)
            .ok()
            .filter(|s| !s.is_empty());
        self
    }
}

/// Result of a submission run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Every postcondition already holds; nothing was written.
    NothingToDo { directory: PathBuf },
    /// Dry run: the plan that would have been submitted.
    Planned(SubmissionPlan),
    /// The master script ran; `manifest` lists the job ids.
    Submitted { plan: SubmissionPlan, manifest: PathBuf },
}

/// `<current executable> exec`, the runner baked into generated task files.
pub fn default_runner() -> Result<String> {
    let exe = std::env::current_exe().context("locating the slurmdag executable")?;
    Ok(format!("{} exec", shell_quote(&exe.to_string_lossy())))
}

/// Plan and submit `ctx`.
///
/// Order of work: materialize the run directory, prune and linearize, render
/// and package everything in memory, write the artifacts, run the master
/// script, copy the manifest to the store, and clean up. Any planning or
/// packaging failure happens before the first artifact is written.
pub async fn submit(
    ctx: &Context,
    options: &SubmitOptions,
    fs: &dyn FileSystem,
    backend: &mut dyn SubmitBackend,
    registry: &HandlerRegistry,
) -> Result<SubmitOutcome> {
    let run_dir = materialize_directory(options, fs)?;
    let directory = run_dir.path.clone();
    let layout = RunLayout::new(&directory);
    info!(directory = ?directory, nodes = ctx.len(), "planning submission");

    let prune_root = options.prune_root.as_deref().unwrap_or(&directory);
    let pruned = prune(ctx, fs, prune_root)?;
    if pruned.is_empty() {
        info!("postconditions of the task graph are met; nothing to do");
        return Ok(SubmitOutcome::NothingToDo { directory });
    }
    let order = linearize(&pruned)?;

    let commands = Commands {
        runner: match &options.runner {
            Some(runner) => runner.clone(),
            None => default_runner()?,
        },
        sbatch: options.sbatch.clone(),
    };
    let policy = DefaultPolicy {
        partition: options.partition.clone(),
        environment: options.environment.clone(),
        ambient_environment: options.ambient_environment.clone(),
    };
    let plan = build_plan(&pruned, &order, &layout, &policy, &commands)?;

    let mut payloads = Vec::with_capacity(order.len());
    for id in &order {
        let node = pruned.node(*id).ok_or_else(|| {
            SlurmdagError::MissingDependency(format!("{id} vanished from the pruned graph"))
        })?;
        payloads.push((layout.payload_file(*id), package(node, registry)?));
    }

    if options.dry_run {
        info!(nodes = plan.entries.len(), "dry run; nothing written");
        return Ok(SubmitOutcome::Planned(plan));
    }

    run_dir.persist();
    fs.create_dir_all(&layout.tasks_dir())?;
    for (path, packaged) in &payloads {
        fs.write(path, &packaged.bytes)?;
    }
    for entry in &plan.entries {
        fs.write(&entry.task_file, entry.task_file_text.as_bytes())?;
        debug!(node = %entry.node, variable = %entry.variable, file = ?entry.task_file, "wrote task file");
    }
    let pipeline = layout.pipeline();
    fs.write(&pipeline, plan.script.as_bytes())?;
    info!(script = ?pipeline, nodes = plan.entries.len(), "wrote submission plan");

    let code = backend.submit(&pipeline, &directory).await?;
    if code != 0 {
        // Jobs accepted before the failure are queued; keep their ids with the store.
        if let Some(store) = &options.store {
            if let Err(err) = copy_manifest(fs, &layout, store) {
                warn!(error = %err, "could not copy partial job manifest");
            }
        }
        warn!(code, manifest = ?layout.manifest(), "submission script failed; manifest lists the accepted jobs");
        return Err(SlurmdagError::Submission(code));
    }
    info!(nodes = plan.entries.len(), "submitted task graph");

    let manifest = match &options.store {
        Some(store) => copy_manifest(fs, &layout, store)?,
        None => layout.manifest(),
    };

    if options.cleanup {
        fs.remove_file(&pipeline)?;
        fs.remove_dir_all(&layout.tasks_dir())?;
        debug!("removed generated scripts");
    }

    Ok(SubmitOutcome::Submitted { plan, manifest })
}

/// The run directory, plus the guard of a freshly created temporary one.
///
/// A temporary directory is removed again when the guard drops, so runs
/// that end before writing anything (nothing to do, planning or packaging
/// errors) leave no trace.
struct RunDirectory {
    path: PathBuf,
    scratch: Option<tempfile::TempDir>,
}

impl RunDirectory {
    /// Keep the directory past the end of the run.
    fn persist(self) {
        if let Some(scratch) = self.scratch {
            let kept = scratch.keep();
            debug!(directory = ?kept, "keeping temporary run directory");
        }
    }
}

fn materialize_directory(options: &SubmitOptions, fs: &dyn FileSystem) -> Result<RunDirectory> {
    let (path, scratch) = match &options.directory {
        Some(dir) if options.dry_run => (std::path::absolute(dir)?, None),
        Some(dir) => {
            fs.create_dir_all(dir)?;
            (fs.canonicalize(dir)?, None)
        }
        None if options.dry_run => (std::env::temp_dir().join("slurmdag-dry-run"), None),
        None => {
            let scratch = tempfile::Builder::new().prefix("slurmdag-").tempdir()?;
            let path = fs
                .canonicalize(scratch.path())
                .unwrap_or_else(|_| scratch.path().to_path_buf());
            (path, Some(scratch))
        }
    };
    Ok(RunDirectory { path, scratch })
}

fn copy_manifest(fs: &dyn FileSystem, layout: &RunLayout, store: &Path) -> Result<PathBuf> {
    fs.create_dir_all(store)?;
    let store = fs.canonicalize(store)?;
    if store == layout.root() {
        return Ok(layout.manifest());
    }
    if !fs.is_file(&layout.manifest()) {
        warn!(manifest = ?layout.manifest(), "submission script produced no job manifest");
        return Ok(layout.manifest());
    }
    let target = store.join(crate::emit::layout::MANIFEST_FILE);
    fs.copy(&layout.manifest(), &target)?;
    info!(store = ?target, "copied job manifest");
    Ok(target)
}
