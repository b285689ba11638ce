// src/dag/critical_path.rs

//! Critical Path Method over an ordered dependency graph.

use crate::dag::graph::DependencyGraph;

/// Earliest start/finish offsets (whole days from pipeline day 0) for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarliestTimes {
    pub start: u64,
    pub finish: u64,
}

/// Result of a CPM pass, indexed by graph node.
#[derive(Debug, Clone)]
pub struct CriticalPath {
    pub times: Vec<EarliestTimes>,
    /// Node indices of the longest chain, first task first.
    pub chain: Vec<usize>,
    pub total_duration_days: u64,
}

/// Forward pass plus backward chain extraction.
///
/// `order` must be a topological order of `graph`, so each dependency's
/// finish is known by the time its dependents are visited.
pub fn compute_critical_path(graph: &DependencyGraph, order: &[usize]) -> CriticalPath {
    let mut times = vec![EarliestTimes { start: 0, finish: 0 }; graph.len()];

    for &node in order {
        let start = graph
            .dependencies_of(node)
            .iter()
            .map(|&dep| times[dep].finish)
            .max()
            .unwrap_or(0);
        let finish = start + u64::from(graph.task(node).duration_days);
        times[node] = EarliestTimes { start, finish };
    }

    let end = latest_finishing(graph, &times, order.iter().copied());
    let total_duration_days = end.map(|node| times[node].finish).unwrap_or(0);

    let mut chain = Vec::new();
    let mut cursor = end;
    while let Some(node) = cursor {
        chain.push(node);
        cursor = latest_finishing(graph, &times, graph.dependencies_of(node).iter().copied());
    }
    chain.reverse();

    CriticalPath {
        times,
        chain,
        total_duration_days,
    }
}

/// Candidate with the greatest earliest finish; ties go to the smallest id.
fn latest_finishing(
    graph: &DependencyGraph,
    times: &[EarliestTimes],
    candidates: impl Iterator<Item = usize>,
) -> Option<usize> {
    candidates.reduce(|best, node| {
        let better = times[node].finish > times[best].finish
            || (times[node].finish == times[best].finish
                && graph.task(node).id < graph.task(best).id);
        if better { node } else { best }
    })
}
