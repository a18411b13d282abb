//! Evaluation settings.

use serde::{Deserialize, Serialize};

use crate::selector::ast::ExpandDepth;

/// What an expression starting with `!` subtracts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadingExclusion {
    /// `!x,...` behaves like `*,!x,...`.
    #[default]
    FromAll,
    /// `!x,...` subtracts from the empty set, so it contributes nothing.
    FromEmpty,
}

/// Settings for one [`ModelSelector`](crate::ModelSelector).
///
/// Deserializes with defaults for missing fields, so an empty document
/// (`{}`) is a valid config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Cap applied to `+`/`@` expansions that do not give an explicit depth.
    pub max_depth: Option<usize>,
    pub leading_exclusion: LeadingExclusion,
}

impl SelectorConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_leading_exclusion(mut self, policy: LeadingExclusion) -> Self {
        self.leading_exclusion = policy;
        self
    }

    /// Depth to actually walk for a clause that asked for `requested`.
    pub fn effective_depth(&self, requested: ExpandDepth) -> ExpandDepth {
        match (requested, self.max_depth) {
            (ExpandDepth::Unbounded, Some(cap)) => ExpandDepth::Max(cap),
            (depth, _) => depth,
        }
    }
}
