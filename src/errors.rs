// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlurmdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Cycle detected in task graph: {0}")]
    Cycle(String),

    #[error("Cannot package node {node} for out-of-process execution: {reason}")]
    Packaging { node: String, reason: String },

    #[error("Postcondition evaluation failed: {0}")]
    Postcondition(anyhow::Error),

    #[error("Runner error: {0}")]
    Runner(String),

    #[error("Submission script exited with code {0}")]
    Submission(i32),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SlurmdagError>;
