//! Immutable adjacency-list graph of dbt models.
//!
//! Built once from the nodes handed over by the project parser and never
//! mutated afterwards, so a single snapshot can be shared by reference
//! between any number of concurrent evaluations.

use hashbrown::HashMap;
use serde::Deserialize;
use smallvec::SmallVec;

use super::{ModelNode, NodeIdx};
use crate::{Error, Result};

type Adjacency = SmallVec<[NodeIdx; 4]>;

/// Traversal direction along dependency edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards parents (ancestors).
    Upstream,
    /// Towards children (descendants).
    Downstream,
    /// Ancestors and descendants, each walked separately.
    Both,
}

/// Identifier-indexed dependency graph.
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    nodes: Vec<ModelNode>,
    index: HashMap<String, NodeIdx>,
    parents: Vec<Adjacency>,
    children: Vec<Adjacency>,
}

/// `{"models": [...]}`; the other accepted layout is a bare array.
#[derive(Deserialize)]
struct Manifest {
    models: Vec<ModelNode>,
}

impl ModelGraph {
    /// Build a graph from nodes in the order they should be reported.
    ///
    /// Edges are the union of every node's declared parents and children.
    /// Edges that name an unknown model (sources, disabled models) are
    /// skipped.
    pub fn from_nodes(nodes: impl IntoIterator<Item = ModelNode>) -> Result<Self> {
        let nodes: Vec<ModelNode> = nodes.into_iter().collect();
        if nodes.len() > u32::MAX as usize {
            return Err(Error::GraphError(format!("Too many models: {}", nodes.len())));
        }

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.name.clone(), NodeIdx(i as u32)).is_some() {
                return Err(Error::GraphError(format!("Duplicate model identifier '{}'", node.name)));
            }
        }

        let mut parents: Vec<Adjacency> = vec![SmallVec::new(); nodes.len()];
        let mut children: Vec<Adjacency> = vec![SmallVec::new(); nodes.len()];

        for (i, node) in nodes.iter().enumerate() {
            let this = NodeIdx(i as u32);

            for parent in &node.parents {
                match index.get(parent.as_str()) {
                    Some(&p) => link(&mut parents, &mut children, p, this),
                    None => tracing::debug!(model = %node.name, parent = %parent, "ignoring edge to unknown parent"),
                }
            }
            for child in &node.children {
                match index.get(child.as_str()) {
                    Some(&c) => link(&mut parents, &mut children, this, c),
                    None => tracing::debug!(model = %node.name, child = %child, "ignoring edge to unknown child"),
                }
            }
        }

        Ok(Self { nodes, index, parents, children })
    }

    /// Parse a JSON snapshot: either an array of nodes or `{"models": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_document(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl std::io::Read) -> Result<Self> {
        Self::from_document(serde_json::from_reader(reader)?)
    }

    /// Read a JSON snapshot from disk.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Dispatch on the document's shape first so a bad node reports its
    /// own field error instead of a generic layout mismatch.
    fn from_document(doc: serde_json::Value) -> Result<Self> {
        let nodes: Vec<ModelNode> = match doc {
            serde_json::Value::Object(_) => serde_json::from_value::<Manifest>(doc)?.models,
            _ => serde_json::from_value(doc)?,
        };
        Self::from_nodes(nodes)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<NodeIdx> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&ModelNode> {
        self.index_of(name).map(|idx| self.node(idx))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Panics if `idx` did not come from this graph.
    pub fn node(&self, idx: NodeIdx) -> &ModelNode {
        &self.nodes[idx.index()]
    }

    /// Direct upstream dependencies.
    pub fn parents(&self, idx: NodeIdx) -> &[NodeIdx] {
        &self.parents[idx.index()]
    }

    /// Direct downstream dependents.
    pub fn children(&self, idx: NodeIdx) -> &[NodeIdx] {
        &self.children[idx.index()]
    }

    /// Neighbours in one direction. `Both` yields parents then children.
    pub fn neighbors(&self, idx: NodeIdx, dir: Direction) -> impl Iterator<Item = NodeIdx> + '_ {
        let none: &[NodeIdx] = &[];
        let (up, down) = match dir {
            Direction::Upstream => (self.parents(idx), none),
            Direction::Downstream => (none, self.children(idx)),
            Direction::Both => (self.parents(idx), self.children(idx)),
        };
        up.iter().chain(down.iter()).copied()
    }

    /// All indices in graph order.
    pub fn indices(&self) -> impl ExactSizeIterator<Item = NodeIdx> {
        (0..self.nodes.len() as u32).map(NodeIdx)
    }

    pub fn nodes(&self) -> &[ModelNode] {
        &self.nodes
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.name.as_str())
    }

    pub fn edge_count(&self) -> usize {
        self.children.iter().map(|c| c.len()).sum()
    }
}

fn link(parents: &mut [Adjacency], children: &mut [Adjacency], from: NodeIdx, to: NodeIdx) {
    let down = &mut children[from.index()];
    if !down.contains(&to) {
        down.push(to);
        parents[to.index()].push(from);
    }
}
