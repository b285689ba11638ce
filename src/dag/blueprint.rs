// src/dag/blueprint.rs

use std::collections::HashMap;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::TaskDefinition;
use crate::dag::critical_path::compute_critical_path;
use crate::dag::graph::DependencyGraph;
use crate::dag::parallel::{ParallelGroup, parallel_groups};
use crate::errors::{PipelineError, Result};
use crate::types::TaskId;

/// A task with its CPM timings. Immutable once the blueprint is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub definition: TaskDefinition,
    pub earliest_start: u64,
    pub earliest_finish: u64,
    /// Whether the task lies on the longest dependency chain.
    ///
    /// Unrelated to `definition.priority`, which is the catalog's own
    /// criticality tag.
    pub is_on_critical_path: bool,
    /// Positions (in blueprint order) of the direct dependencies.
    pub dependency_positions: Vec<usize>,
    /// Positions (in blueprint order) of the direct dependents.
    pub dependent_positions: Vec<usize>,
}

impl ScheduledTask {
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn duration_days(&self) -> u64 {
        u64::from(self.definition.duration_days)
    }
}

/// The precomputed scheduling shape of a task catalog.
///
/// Depends only on the task definitions, so one blueprint can be shared
/// (behind an `Arc`) by any number of concurrently tracked cases.
///
/// Deserialization goes through [`RawPipelineBlueprint`]: the id index is
/// rebuilt from `tasks` and every position is range-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPipelineBlueprint")]
pub struct PipelineBlueprint {
    /// Tasks in topological order.
    tasks: Vec<ScheduledTask>,
    #[serde(skip_serializing)]
    positions: HashMap<TaskId, usize>,
    critical_path_ids: Vec<TaskId>,
    parallel_groups: Vec<ParallelGroup>,
    total_duration_days: u64,
}

/// Persisted form of a [`PipelineBlueprint`], before its indices are checked.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipelineBlueprint {
    pub tasks: Vec<ScheduledTask>,
    pub critical_path_ids: Vec<TaskId>,
    pub parallel_groups: Vec<ParallelGroup>,
    pub total_duration_days: u64,
}

impl TryFrom<RawPipelineBlueprint> for PipelineBlueprint {
    type Error = PipelineError;

    fn try_from(raw: RawPipelineBlueprint) -> std::result::Result<Self, Self::Error> {
        let mut positions = HashMap::with_capacity(raw.tasks.len());
        for (pos, task) in raw.tasks.iter().enumerate() {
            if positions.insert(task.definition.id.clone(), pos).is_some() {
                return Err(PipelineError::DuplicateTask(task.definition.id.clone()));
            }
        }

        for (pos, task) in raw.tasks.iter().enumerate() {
            // Dependencies come strictly before a task, dependents strictly after.
            let deps_ok = task.dependency_positions.iter().all(|&dep| dep < pos);
            let dependents_ok = task
                .dependent_positions
                .iter()
                .all(|&next| next > pos && next < raw.tasks.len());
            if !deps_ok || !dependents_ok {
                return Err(PipelineError::InconsistentState(format!(
                    "task '{}' links to positions outside topological order",
                    task.id()
                )));
            }
        }

        let referenced = raw
            .critical_path_ids
            .iter()
            .chain(raw.parallel_groups.iter().flat_map(|g| g.task_ids.iter()));
        for id in referenced {
            if !positions.contains_key(id) {
                return Err(PipelineError::UnknownTask(id.clone()));
            }
        }

        Ok(Self {
            tasks: raw.tasks,
            positions,
            critical_path_ids: raw.critical_path_ids,
            parallel_groups: raw.parallel_groups,
            total_duration_days: raw.total_duration_days,
        })
    }
}

/// Build a blueprint from a flat task list.
///
/// Fails with a duplicate-id, invalid-duration, dangling-reference or cycle
/// error; no partial blueprint is ever returned.
pub fn build_blueprint(tasks: &[TaskDefinition]) -> Result<PipelineBlueprint> {
    let graph = DependencyGraph::from_tasks(tasks)?;
    let order = graph.topological_order()?;
    let cpm = compute_critical_path(&graph, &order);

    // Graph index -> blueprint position.
    let mut position_of = vec![0usize; graph.len()];
    for (pos, &node) in order.iter().enumerate() {
        position_of[node] = pos;
    }

    let mut on_chain = vec![false; graph.len()];
    for &node in &cpm.chain {
        on_chain[node] = true;
    }

    let scheduled: Vec<ScheduledTask> = order
        .iter()
        .map(|&node| {
            let times = cpm.times[node];
            ScheduledTask {
                definition: graph.task(node).clone(),
                earliest_start: times.start,
                earliest_finish: times.finish,
                is_on_critical_path: on_chain[node],
                dependency_positions: graph
                    .dependencies_of(node)
                    .iter()
                    .map(|&dep| position_of[dep])
                    .collect(),
                dependent_positions: graph
                    .dependents_of(node)
                    .iter()
                    .map(|&dep| position_of[dep])
                    .collect(),
            }
        })
        .collect();

    let positions = scheduled
        .iter()
        .enumerate()
        .map(|(pos, task)| (task.definition.id.clone(), pos))
        .collect();

    let critical_path_ids: Vec<TaskId> = cpm
        .chain
        .iter()
        .map(|&node| graph.task(node).id.clone())
        .collect();

    let parallel_groups = parallel_groups(&scheduled);

    info!(
        tasks = scheduled.len(),
        total_duration_days = cpm.total_duration_days,
        critical_path = ?critical_path_ids,
        "pipeline blueprint built"
    );
    debug!(groups = parallel_groups.len(), "parallel groups derived");

    Ok(PipelineBlueprint {
        tasks: scheduled,
        positions,
        critical_path_ids,
        parallel_groups,
        total_duration_days: cpm.total_duration_days,
    })
}

impl PipelineBlueprint {
    /// Tasks in topological order.
    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn task(&self, id: &str) -> Option<&ScheduledTask> {
        self.position(id).map(|pos| &self.tasks[pos])
    }

    pub fn critical_path_ids(&self) -> &[TaskId] {
        &self.critical_path_ids
    }

    pub fn parallel_groups(&self) -> &[ParallelGroup] {
        &self.parallel_groups
    }

    /// Theoretical fastest completion: the maximum earliest finish.
    pub fn total_duration_days(&self) -> u64 {
        self.total_duration_days
    }

    /// Graphviz rendering of the dependency graph; critical-path tasks are
    /// drawn in red.
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraph<String, &'static str> = DiGraph::new();

        let nodes: Vec<NodeIndex> = self
            .tasks
            .iter()
            .map(|task| {
                graph.add_node(format!(
                    "{} [{}-{}d]",
                    task.id(),
                    task.earliest_start,
                    task.earliest_finish
                ))
            })
            .collect();

        for (pos, task) in self.tasks.iter().enumerate() {
            for &dep in &task.dependency_positions {
                graph.add_edge(nodes[dep], nodes[pos], "");
            }
        }

        let node_attrs = |_, (index, _): (NodeIndex, &String)| {
            if self.tasks[index.index()].is_on_critical_path {
                "color=red".to_string()
            } else {
                String::new()
            }
        };
        let dot = Dot::with_attr_getters(
            &graph,
            &[Config::EdgeNoLabel],
            &|_, _| String::new(),
            &node_attrs,
        );

        format!("{dot}")
    }
}
