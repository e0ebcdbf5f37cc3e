// src/submit/mod.rs

//! Submission driver.
//!
//! - [`driver`] runs a whole submission: prune, linearize, render, package,
//!   write, submit, copy the manifest, clean up.
//! - [`backend`] provides the `SubmitBackend` trait and the `bash`-based
//!   implementation used in production.
//!
//! Responsibility ends when the master script returns: job execution and
//! ordering on the cluster are up to the scheduler.

pub mod backend;
pub mod driver;

pub use backend::{BashSubmitBackend, SubmitBackend};
pub use driver::{default_runner, submit, SubmitOptions, SubmitOutcome, DEFAULT_SBATCH};
