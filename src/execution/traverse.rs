//! Transitive closure over dependency edges.

use crate::model::{Direction, ModelGraph, NodeIdx};
use crate::selector::ast::ExpandDepth;

/// Seeds plus everything reachable from them in `dir`, in discovery order.
///
/// Breadth-first with a visited set, so cycles terminate. `Direction::Both`
/// is the union of the ancestor and descendant closures, not a walk that
/// may turn around mid-path (that would pull in siblings).
pub fn expand(graph: &ModelGraph, seeds: &[NodeIdx], dir: Direction, depth: ExpandDepth) -> Vec<NodeIdx> {
    match dir {
        Direction::Upstream | Direction::Downstream => closure(graph, seeds, dir, depth),
        Direction::Both => {
            let mut out = closure(graph, seeds, Direction::Upstream, depth);
            let mut seen = vec![false; graph.len()];
            for idx in &out {
                seen[idx.index()] = true;
            }
            for idx in closure(graph, seeds, Direction::Downstream, depth) {
                if !seen[idx.index()] {
                    seen[idx.index()] = true;
                    out.push(idx);
                }
            }
            out
        }
    }
}

fn closure(graph: &ModelGraph, seeds: &[NodeIdx], dir: Direction, depth: ExpandDepth) -> Vec<NodeIdx> {
    let mut visited = vec![false; graph.len()];
    let mut out = Vec::new();
    let mut frontier = Vec::new();

    for &seed in seeds {
        if !visited[seed.index()] {
            visited[seed.index()] = true;
            out.push(seed);
            frontier.push(seed);
        }
    }

    let mut hops = 0;
    while !frontier.is_empty() && depth.allows(hops) {
        let mut next = Vec::new();
        for &node in &frontier {
            for neighbor in graph.neighbors(node, dir) {
                if !visited[neighbor.index()] {
                    visited[neighbor.index()] = true;
                    out.push(neighbor);
                    next.push(neighbor);
                }
            }
        }
        frontier = next;
        hops += 1;
    }

    out
}
