//! # dbt Model Graph
//!
//! Plain data handed in by the project parser: model nodes, their
//! materialization, and the immutable dependency graph built from them.
//!
//! Design rule: no selector types here. This module is pure data: no I/O
//! beyond JSON decoding, no shared mutable state.

pub mod graph;
pub mod materialization;
pub mod node;

pub use graph::{Direction, ModelGraph};
pub use materialization::Materialization;
pub use node::{ModelNode, NodeIdx};
