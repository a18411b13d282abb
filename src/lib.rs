//! # dbt-selector — dbt Model Selection in Rust
//!
//! Evaluates dbt's selection mini-language against an immutable dependency
//! graph of models and returns a deterministic working set.
//!
//! ## Design Principles
//!
//! 1. **Graph is a snapshot**: `ModelGraph` is built once and never mutated
//! 2. **Parser owns nothing**: selector string → AST is a pure function
//! 3. **Left to right**: clauses are applied in textual order, exclusions included
//! 4. **Stable output**: first-occurrence order, identical across runs
//!
//! ## Quick Start
//!
//! ```rust
//! use dbt_selector::{Materialization, ModelGraph, ModelNode, ModelSelector};
//!
//! # fn example() -> dbt_selector::Result<()> {
//! let graph = ModelGraph::from_nodes([
//!     ModelNode::new("stg_orders").with_tags(["staging"]),
//!     ModelNode::new("fct_orders").with_tags(["marts"]).depends_on(["stg_orders"]),
//!     ModelNode::new("rpt_orders")
//!         .with_tags(["marts"])
//!         .with_materialization(Materialization::Table)
//!         .depends_on(["fct_orders"]),
//! ])?;
//!
//! let selector = ModelSelector::new(&graph);
//! assert_eq!(
//!     selector.select("tag:marts,!config.materialized:table")?,
//!     vec!["fct_orders"],
//! );
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Selector Syntax
//!
//! | Form | Meaning |
//! |------|---------|
//! | `name` | Model with that exact identifier |
//! | `*` | Every model |
//! | `tag:t` | Models tagged `t` |
//! | `config.materialized:k` | Models materialized as `k` |
//! | `models/staging`, `path:models` | Models under that path (segment-wise) |
//! | `+x` / `+2x` | `x` and its descendants (at most 2 hops) |
//! | `@x` / `@2x` | `x` and its ancestors (at most 2 hops) |
//! | `!x` | Remove `x` from what is selected so far |
//! | `a,b` | Apply `a`, then `b` |
//!
//! A depth may be spaced off the name (`+2 x`). Written flush, as in
//! `+2020_orders`, the digits are read as part of the name when only that
//! reading names a model in the graph.

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod selector;
pub mod execution;
pub mod config;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{Direction, Materialization, ModelGraph, ModelNode, NodeIdx};
pub use selector::parse;
pub use selector::ast::{Clause, ExpandDepth, FlushDepth, Operator, SelectorExpr, SelectorMethod};
pub use execution::{evaluate, Selection};
pub use config::{LeadingExclusion, SelectorConfig};

// ============================================================================
// Top-level selector handle
// ============================================================================

/// The primary entry point. Binds a graph snapshot and evaluation settings.
///
/// Borrowing keeps it cheap: build one per request, or share one across
/// threads; the graph is never written to.
#[derive(Debug, Clone, Copy)]
pub struct ModelSelector<'g> {
    graph: &'g ModelGraph,
    config: SelectorConfig,
}

impl<'g> ModelSelector<'g> {
    pub fn new(graph: &'g ModelGraph) -> Self {
        Self { graph, config: SelectorConfig::default() }
    }

    pub fn with_config(mut self, config: SelectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn graph(&self) -> &'g ModelGraph {
        self.graph
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Parse and evaluate an expression.
    pub fn selection(&self, input: &str) -> Result<Selection> {
        let expr = parse(input)?;
        Ok(evaluate(self.graph, &expr, &self.config))
    }

    /// Evaluate `select`, then drop everything `exclude` selects on its own.
    pub fn selection_excluding(&self, select: &str, exclude: &str) -> Result<Selection> {
        let mut selected = self.selection(select)?;
        let excluded = self.selection(exclude)?;
        selected.subtract(&excluded);
        Ok(selected)
    }

    /// Selected model identifiers in first-occurrence order.
    pub fn select(&self, input: &str) -> Result<Vec<String>> {
        Ok(self.selection(input)?.identifiers(self.graph))
    }

    /// Like [`select`](Self::select) but returns the model nodes.
    pub fn select_models(&self, input: &str) -> Result<Vec<&'g ModelNode>> {
        Ok(self.selection(input)?.models(self.graph))
    }

    pub fn select_excluding(&self, select: &str, exclude: &str) -> Result<Vec<String>> {
        Ok(self.selection_excluding(select, exclude)?.identifiers(self.graph))
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid selector syntax at position {position}: {message}")]
    InvalidSelectorSyntax { position: usize, message: String },

    #[error("Unknown materialization kind: '{0}'")]
    UnknownMaterializationKind(String),

    #[error("Graph error: {0}")]
    GraphError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
