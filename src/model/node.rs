//! Model node in the dbt dependency graph.

use serde::{Deserialize, Serialize};
use super::Materialization;

/// Dense index of a node inside a [`ModelGraph`](super::ModelGraph).
///
/// Only meaningful for the graph that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A dbt model as supplied by the project parser.
///
/// `parents` and `children` name other models by identifier. Either side of
/// an edge is enough: the graph mirrors them when it is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    #[serde(alias = "identifier")]
    pub name: String,
    #[serde(default, alias = "original_file_path")]
    pub path: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "materialized")]
    pub materialization: Materialization,
    #[serde(default, alias = "schema_name", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, rename = "depends_on", alias = "parents")]
    pub parents: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

impl ModelNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: String::new(),
            tags: Vec::new(),
            materialization: Materialization::default(),
            schema: None,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_materialization(mut self, materialization: Materialization) -> Self {
        self.materialization = materialization;
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Declare direct upstream dependencies.
    pub fn depends_on(mut self, parents: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.parents.extend(parents.into_iter().map(Into::into));
        self
    }

    /// Declare direct downstream dependents.
    pub fn with_children(mut self, children: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
