//! Connected-component extraction.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::graph::Graph;

/// The giant component of a graph, with retention bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentReport {
    /// Node indices of the largest component, ascending.
    pub nodes: Vec<usize>,
    /// Number of nodes retained (the component size).
    pub retained: usize,
    /// Total nodes in the graph.
    pub total: usize,
}

/// Partition nodes into connected components.
///
/// Components are discovered by breadth-first search in ascending
/// node-index order, so the returned list is ordered by each
/// component's smallest member and isolated nodes appear as singleton
/// components.
pub fn connected_components(graph: &Graph) -> Vec<Vec<usize>> {
    let n = graph.nodes();
    let mut visited = vec![false; n];
    let mut components = Vec::new();

    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut component = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(node) = queue.pop_front() {
            component.push(node);
            for neighbor in graph.neighbors(node) {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }
    components
}

/// The component with the most nodes.
///
/// Ties go to the component encountered first in node-index order.
pub fn giant_component(graph: &Graph) -> ComponentReport {
    let components = connected_components(graph);
    let total = graph.nodes();

    let giant = components
        .iter()
        .max_by(|a, b| {
            // max_by keeps the later of equal elements; compare so that
            // the first-encountered component wins ties.
            a.len().cmp(&b.len()).then(std::cmp::Ordering::Greater)
        })
        .cloned()
        .unwrap_or_default();

    ComponentReport {
        retained: giant.len(),
        total,
        nodes: giant,
    }
}
