// src/dag/parallel.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dag::blueprint::ScheduledTask;
use crate::types::TaskId;

/// Tasks that share an earliest start and can therefore be worked at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelGroup {
    pub earliest_start: u64,
    pub task_ids: Vec<TaskId>,
}

/// Group scheduled tasks by identical `earliest_start`.
///
/// Singletons are dropped. Groups come out by ascending start day, members in
/// the order of `tasks`. Read-only over the computed times.
pub fn parallel_groups(tasks: &[ScheduledTask]) -> Vec<ParallelGroup> {
    let mut by_start: BTreeMap<u64, Vec<TaskId>> = BTreeMap::new();

    for task in tasks {
        by_start
            .entry(task.earliest_start)
            .or_default()
            .push(task.definition.id.clone());
    }

    by_start
        .into_iter()
        .filter(|(_, ids)| ids.len() >= 2)
        .map(|(earliest_start, task_ids)| ParallelGroup {
            earliest_start,
            task_ids,
        })
        .collect()
}
