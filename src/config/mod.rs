// src/config/mod.rs

//! Workflow file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a workflow file from disk (`loader.rs`).
//! - Validate task definitions and DAG correctness (`validate.rs`).
//! - Build the task graph from a validated file (`build.rs`).

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::build_context;
pub use loader::{config_root_dir, load_and_validate, parse_raw, DEFAULT_CONFIG_FILE};
pub use model::{ConfigFile, ConfigSection, DefaultSection, RawConfigFile, TaskConfig};
