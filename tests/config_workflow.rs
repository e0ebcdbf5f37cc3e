// tests/config_workflow.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::{mock_options, FakeSubmitter};

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use slurmdag::cli::{CliArgs, Command, SubmitArgs};
use slurmdag::config::{build_context, load_and_validate, ConfigFile};
use slurmdag::errors::SlurmdagError;
use slurmdag::fs::mock::MockFileSystem;
use slurmdag::payload::HandlerRegistry;
use slurmdag::submit::{submit, SubmitOutcome};
use slurmdag::submit_options;
use tempfile::tempdir;

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("Slurmdag.toml");
    fs::write(&path, contents).expect("write config");
    (dir, path)
}

fn submit_args(argv: &[&str]) -> SubmitArgs {
    let mut full = vec!["slurmdag", "submit"];
    full.extend_from_slice(argv);
    match CliArgs::try_parse_from(full).expect("parse").command {
        Command::Submit(args) => args,
        other => panic!("expected submit, got {other:?}"),
    }
}

#[test]
fn cyclic_workflow_is_rejected_on_load() {
    let (_dir, path) = write_config(
        r#"
[task.a]
cmd = "true"
after = ["c"]

[task.b]
cmd = "true"
after = ["a"]

[task.c]
cmd = "true"
after = ["b"]
"#,
    );

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, SlurmdagError::Cycle(_)), "got {err:?}");
}

#[test]
fn unknown_dependency_is_rejected_on_load() {
    let (_dir, path) = write_config(
        r#"
[task.train]
cmd = "true"
after = ["simulate"]
"#,
    );

    let err = load_and_validate(&path).unwrap_err();
    match err {
        SlurmdagError::ConfigError(msg) => assert!(msg.contains("simulate"), "{msg}"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let (_dir, path) = write_config("[task.a\ncmd = ");
    assert!(matches!(
        load_and_validate(&path),
        Err(SlurmdagError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("nope.toml")),
        Err(SlurmdagError::IoError(_))
    ));
}

#[tokio::test]
async fn workflow_file_compiles_to_a_plan() {
    let (_dir, path) = write_config(
        r#"
[default]
directives = { time = "00:30:00" }

[task.simulate]
cmd = "python simulate.py --seed $1"
tasks = 3

[task.train]
handler = "touch"
args = { paths = ["model.txt"] }
after = ["simulate"]
directives = { time = "02:00:00", gres = "gpu:1" }
"#,
    );
    let cfg = load_and_validate(&path).unwrap();
    let ctx = build_context(&cfg).unwrap();

    let fs = MockFileSystem::new();
    let mut backend = FakeSubmitter::new(fs.clone());
    let outcome = submit(&ctx, &mock_options(), &fs, &mut backend, &HandlerRegistry::builtin())
        .await
        .unwrap();

    let SubmitOutcome::Submitted { plan, .. } = outcome else {
        panic!("expected a submission");
    };
    let names: Vec<_> = plan.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["simulate", "train"]);

    let simulate = &plan.entries[0];
    assert!(simulate.directives.contains(&"#SBATCH --time=00:30:00".to_string()));
    assert!(simulate.directives.contains(&"#SBATCH --array=0-2".to_string()));

    let train = &plan.entries[1];
    assert!(train.directives.contains(&"#SBATCH --time=02:00:00".to_string()));
    assert!(train.directives.contains(&"#SBATCH --gres=gpu:1".to_string()));
    assert_eq!(train.dependency.as_deref(), Some("--dependency=afterok:$t0"));
}

#[tokio::test]
async fn unregistered_handler_fails_before_writing() {
    let cfg: ConfigFile = ConfigFileBuilder::new()
        .with_task("fit", TaskConfigBuilder::handler("fit_model").build())
        .build();
    let ctx = build_context(&cfg).unwrap();

    let fs = MockFileSystem::new();
    let mut backend = FakeSubmitter::new(fs.clone());
    let err = submit(&ctx, &mock_options(), &fs, &mut backend, &HandlerRegistry::builtin())
        .await
        .unwrap_err();

    assert!(matches!(err, SlurmdagError::Packaging { .. }));
    assert!(fs.files_under("/run").is_empty());
}

#[test]
fn cli_flags_override_config_section() {
    let (dir, path) = write_config(
        r#"
[config]
directory = "runs/latest"
partition = "cpu"
store = "archive"
sbatch = "/opt/slurm/bin/sbatch"

[task.a]
cmd = "true"
"#,
    );
    let cfg = load_and_validate(&path).unwrap();
    let config_arg = path.to_string_lossy().to_string();

    let from_file = submit_options(&submit_args(&["--config", &config_arg]), &cfg);
    assert_eq!(from_file.directory, Some(dir.path().join("runs/latest")));
    assert_eq!(from_file.partition.as_deref(), Some("cpu"));
    assert_eq!(from_file.store, Some(dir.path().join("archive")));
    assert_eq!(from_file.sbatch, "/opt/slurm/bin/sbatch");
    assert_eq!(from_file.prune_root.as_deref(), Some(dir.path()));

    let overridden = submit_options(
        &submit_args(&[
            "--config",
            &config_arg,
            "--partition",
            "gpu",
            "--directory",
            "/scratch/run",
            "--cleanup",
        ]),
        &cfg,
    );
    assert_eq!(overridden.directory, Some(PathBuf::from("/scratch/run")));
    assert_eq!(overridden.partition.as_deref(), Some("gpu"));
    assert!(overridden.cleanup);
}
