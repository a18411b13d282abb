//! Selector evaluation engine.
//!
//! Resolves a parsed [`SelectorExpr`] against a [`ModelGraph`]: each clause
//! is matched, expanded along dependency edges, and folded into the running
//! selection left to right.

pub mod matcher;
pub mod traverse;

use std::borrow::Cow;

use crate::config::{LeadingExclusion, SelectorConfig};
use crate::model::{Direction, ModelGraph, ModelNode, NodeIdx};
use crate::selector::ast::{Clause, SelectorExpr, SelectorMethod};

/// An ordered set of nodes: deduplicated, in first-occurrence order.
///
/// Sized for one graph; indices from another graph are out of bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    order: Vec<NodeIdx>,
    members: Vec<bool>,
}

impl Selection {
    pub fn empty(graph: &ModelGraph) -> Self {
        Self { order: Vec::new(), members: vec![false; graph.len()] }
    }

    pub fn all(graph: &ModelGraph) -> Self {
        let mut sel = Self::empty(graph);
        sel.extend(graph.indices());
        sel
    }

    /// Add a node at the end unless already present.
    pub fn insert(&mut self, idx: NodeIdx) -> bool {
        let slot = &mut self.members[idx.index()];
        if *slot {
            return false;
        }
        *slot = true;
        self.order.push(idx);
        true
    }

    pub fn extend(&mut self, nodes: impl IntoIterator<Item = NodeIdx>) {
        for idx in nodes {
            self.insert(idx);
        }
    }

    /// Remove every listed node; the remaining order is kept.
    pub fn remove_all(&mut self, nodes: impl IntoIterator<Item = NodeIdx>) {
        let mut removed = false;
        for idx in nodes {
            let slot = &mut self.members[idx.index()];
            removed |= *slot;
            *slot = false;
        }
        if removed {
            let members = &self.members;
            self.order.retain(|idx| members[idx.index()]);
        }
    }

    pub fn subtract(&mut self, other: &Selection) {
        self.remove_all(other.iter());
    }

    pub fn contains(&self, idx: NodeIdx) -> bool {
        self.members.get(idx.index()).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = NodeIdx> + '_ {
        self.order.iter().copied()
    }

    pub fn identifiers(&self, graph: &ModelGraph) -> Vec<String> {
        self.iter().map(|idx| graph.node(idx).name.clone()).collect()
    }

    pub fn models<'g>(&self, graph: &'g ModelGraph) -> Vec<&'g ModelNode> {
        self.iter().map(|idx| graph.node(idx)).collect()
    }
}

/// Evaluate an expression against a graph.
///
/// Clauses apply in textual order: a positive clause adds its matches, a
/// negated clause removes them from what has been selected so far. An
/// expression that opens with an exclusion starts from the full node set
/// unless the config says otherwise.
pub fn evaluate(graph: &ModelGraph, expr: &SelectorExpr, config: &SelectorConfig) -> Selection {
    let mut selected = if expr.starts_with_exclusion() && config.leading_exclusion == LeadingExclusion::FromAll {
        Selection::all(graph)
    } else {
        Selection::empty(graph)
    };

    for clause in &expr.clauses {
        let clause = pick_reading(graph, clause);
        let matched = resolve_clause(graph, &clause, config);
        tracing::debug!(clause = %clause, matched = matched.len(), "resolved selector clause");

        if clause.negated {
            selected.remove_all(matched);
        } else {
            selected.extend(matched);
        }
    }

    selected
}

/// `+2model` is a depth of 2 over `model`, unless the graph has no `model`
/// but does have `2model`.
fn pick_reading<'c>(graph: &ModelGraph, clause: &'c Clause) -> Cow<'c, Clause> {
    let Some(reading) = clause.flush_name_reading() else {
        return Cow::Borrowed(clause);
    };
    match (&clause.method, &reading.method) {
        (SelectorMethod::Name(split), SelectorMethod::Name(full)) if !graph.contains(split) && graph.contains(full) => {
            tracing::debug!(clause = %clause, reading = %reading, "depth digits read as part of the model name");
            Cow::Owned(reading)
        }
        _ => Cow::Borrowed(clause),
    }
}

/// Matches of one clause after `+`/`@` expansion, in graph order.
/// The `!` flag is left to the caller.
pub fn resolve_clause(graph: &ModelGraph, clause: &Clause, config: &SelectorConfig) -> Vec<NodeIdx> {
    let seeds = matcher::match_method(graph, &clause.method);
    if !clause.expands() || seeds.is_empty() {
        return seeds;
    }

    let walks = match (clause.children, clause.parents) {
        (Some(down), Some(up)) if down == up => vec![(Direction::Both, down)],
        (down, up) => down
            .map(|d| (Direction::Downstream, d))
            .into_iter()
            .chain(up.map(|d| (Direction::Upstream, d)))
            .collect(),
    };

    let mut hit = vec![false; graph.len()];
    for (dir, depth) in walks {
        for idx in traverse::expand(graph, &seeds, dir, config.effective_depth(depth)) {
            hit[idx.index()] = true;
        }
    }

    graph.indices().filter(|idx| hit[idx.index()]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Materialization;
    use crate::selector::parse;

    fn orders() -> ModelGraph {
        ModelGraph::from_nodes([
            ModelNode::new("stg_orders").with_tags(["staging"]),
            ModelNode::new("fct_orders").with_tags(["marts"]).depends_on(["stg_orders"]),
            ModelNode::new("rpt_orders")
                .with_tags(["marts"])
                .with_materialization(Materialization::Table)
                .depends_on(["fct_orders"]),
        ])
        .unwrap()
    }

    fn run(g: &ModelGraph, input: &str) -> Vec<String> {
        let expr = parse(input).unwrap();
        evaluate(g, &expr, &SelectorConfig::default()).identifiers(g)
    }

    #[test]
    fn test_selection_order_and_dedup() {
        let g = orders();
        let mut sel = Selection::empty(&g);
        assert!(sel.insert(NodeIdx(2)));
        assert!(sel.insert(NodeIdx(0)));
        assert!(!sel.insert(NodeIdx(2)));
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec![NodeIdx(2), NodeIdx(0)]);

        sel.remove_all([NodeIdx(2)]);
        assert!(!sel.contains(NodeIdx(2)));
        sel.insert(NodeIdx(2));
        // re-added nodes go to the back
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec![NodeIdx(0), NodeIdx(2)]);
    }

    #[test]
    fn test_union_with_expansion() {
        let g = orders();
        assert_eq!(run(&g, "tag:staging,+stg_orders"), vec!["stg_orders", "fct_orders", "rpt_orders"]);
    }

    #[test]
    fn test_exclusion_after_union() {
        let g = orders();
        assert_eq!(run(&g, "tag:marts,!config.materialized:table"), vec!["fct_orders"]);
    }

    #[test]
    fn test_first_occurrence_order() {
        let g = orders();
        assert_eq!(run(&g, "rpt_orders,tag:marts,*"), vec!["rpt_orders", "fct_orders", "stg_orders"]);
    }

    #[test]
    fn test_leading_exclusion_policies() {
        let g = orders();
        assert_eq!(run(&g, "!fct_orders"), vec!["stg_orders", "rpt_orders"]);

        let strict = SelectorConfig::default().with_leading_exclusion(LeadingExclusion::FromEmpty);
        let expr = parse("!fct_orders,rpt_orders").unwrap();
        assert_eq!(evaluate(&g, &expr, &strict).identifiers(&g), vec!["rpt_orders"]);
    }

    #[test]
    fn test_negation_applies_after_expansion() {
        let g = orders();
        assert_eq!(run(&g, "*,!@fct_orders"), vec!["rpt_orders"]);
    }

    #[test]
    fn test_mixed_depths() {
        let g = orders();
        let clause = &parse("+0@1fct_orders").unwrap().clauses[0];
        let got = resolve_clause(&g, clause, &SelectorConfig::default());
        assert_eq!(got, vec![NodeIdx(0), NodeIdx(1)]);
    }

    #[test]
    fn test_digit_leading_names_under_operators() {
        let g = ModelGraph::from_nodes([
            ModelNode::new("2020_orders"),
            ModelNode::new("rpt_2020").depends_on(["2020_orders"]),
            ModelNode::new("orders"),
            ModelNode::new("1orders").depends_on(["orders"]),
            ModelNode::new("2orders").depends_on(["1orders"]),
        ])
        .unwrap();

        assert_eq!(run(&g, "+2020_orders"), vec!["2020_orders", "rpt_2020"]);
        assert_eq!(run(&g, "@rpt_2020,!@2020_orders"), vec!["rpt_2020"]);
        // both names exist: the depth reading wins
        assert_eq!(run(&g, "+1orders"), vec!["orders", "1orders"]);
        assert_eq!(run(&g, "+ 1orders"), vec!["1orders", "2orders"]);
        // neither exists
        assert!(run(&g, "+9missing").is_empty());
    }

    #[test]
    fn test_config_max_depth() {
        let g = orders();
        let expr = parse("+stg_orders").unwrap();
        let capped = SelectorConfig::default().with_max_depth(1);
        assert_eq!(evaluate(&g, &expr, &capped).identifiers(&g), vec!["stg_orders", "fct_orders"]);
    }
}
