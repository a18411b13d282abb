//! Direct matching of a selector method against every node.

use std::path::Path;

use crate::model::{ModelGraph, ModelNode, NodeIdx};
use crate::selector::ast::SelectorMethod;
use crate::selector::parser::normalize_path;

/// Nodes matched by `method`, in graph order. Never fails: no match is an
/// empty vector.
pub fn match_method(graph: &ModelGraph, method: &SelectorMethod) -> Vec<NodeIdx> {
    match method {
        SelectorMethod::All => graph.indices().collect(),
        SelectorMethod::Name(name) => graph.index_of(name).into_iter().collect(),
        SelectorMethod::Tag(tag) => filter(graph, |node| node.has_tag(tag)),
        SelectorMethod::ConfigMaterialized(kind) => filter(graph, |node| node.materialization == *kind),
        SelectorMethod::Path(prefix) => filter(graph, |node| path_matches(&node.path, prefix)),
    }
}

fn filter(graph: &ModelGraph, pred: impl Fn(&ModelNode) -> bool) -> Vec<NodeIdx> {
    graph.indices().filter(|&idx| pred(graph.node(idx))).collect()
}

/// Segment-wise prefix test: `models/a` matches `models/a/x.sql` but not
/// `models/abc.sql`.
pub fn path_matches(node_path: &str, prefix: &str) -> bool {
    let prefix = normalize_path(prefix);
    !prefix.is_empty() && Path::new(&*normalize_path(node_path)).starts_with(&*prefix)
}
