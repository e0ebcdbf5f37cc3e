// src/dag/mod.rs

//! Task graph model and the planning passes over it.
//!
//! - [`node`] defines nodes, node specs and postconditions.
//! - [`graph`] holds the [`Context`]: node set plus dependency relation,
//!   kept acyclic on every insertion.
//! - [`prune`] drops nodes whose postcondition already holds.
//! - [`linearize`] produces the submission order.

pub mod graph;
pub mod linearize;
pub mod node;
pub mod prune;

pub use graph::Context;
pub use linearize::{linearize, positions};
pub use node::{Node, NodeSpec, Postcondition};
pub use prune::prune;
