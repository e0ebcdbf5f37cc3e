// src/payload/mod.rs

//! Relocatable work units.
//!
//! - [`work`] defines the [`Work`] enum and in-process invocation.
//! - [`registry`] maps handler names to functions.
//! - [`package`] serializes a node's work into a TOML [`Payload`].
//! - [`runner`] loads a payload in a fresh process and invokes it.

pub mod package;
pub mod registry;
pub mod runner;
pub mod work;

pub use package::{package, PackagedWork, Payload, PAYLOAD_EXT};
pub use registry::{Handler, HandlerRegistry};
pub use runner::run_payload;
pub use work::{TaskOutcome, Work};
