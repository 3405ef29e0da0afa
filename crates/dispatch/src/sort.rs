//! Execution ordering
//!
//! Kahn's algorithm over the dependency graph. Ready actions wait in a
//! min-heap keyed by (depth, batch position): absent explicit edges,
//! shallower paths run first, and equal depths keep batch order.

use crate::error::{DispatchError, Result};
use crate::graph::DependencyGraph;
use quire_core::VaultAction;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::{debug, error};

/// Linearize `graph` into a safe execution order
///
/// Fails with [`DispatchError::Cycle`] naming every action that could not
/// be scheduled.
pub fn topological_sort(graph: DependencyGraph) -> Result<Vec<VaultAction>> {
    let nodes = graph.into_nodes();
    let total = nodes.len();

    let mut in_degree: Vec<usize> = nodes.iter().map(|n| n.depends_on.len()).collect();
    let depth: Vec<usize> = nodes.iter().map(|n| n.action.depth()).collect();

    let mut ready: BinaryHeap<Reverse<(usize, usize)>> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(id, _)| Reverse((depth[id], id)))
        .collect();

    let mut order: Vec<usize> = Vec::with_capacity(total);
    while let Some(Reverse((_, id))) = ready.pop() {
        order.push(id);
        for &waiting in &nodes[id].required_by {
            in_degree[waiting] -= 1;
            if in_degree[waiting] == 0 {
                ready.push(Reverse((depth[waiting], waiting)));
            }
        }
    }

    if order.len() < total {
        let stranded: Vec<String> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree > 0)
            .map(|(id, _)| nodes[id].action.to_string())
            .collect();
        error!("dependency cycle, {} actions stranded", stranded.len());
        return Err(DispatchError::Cycle { stranded });
    }

    let mut slots: Vec<Option<VaultAction>> = nodes.into_iter().map(|n| Some(n.action)).collect();
    let sorted: Vec<VaultAction> = order.into_iter().filter_map(|id| slots[id].take()).collect();
    debug!(
        "execution order: [{}]",
        sorted.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
    );
    Ok(sorted)
}
