// src/dag/graph.rs

use std::collections::HashMap;

use tracing::debug;

use crate::catalog::TaskDefinition;
use crate::errors::{PipelineError, Result};
use crate::types::TaskId;

/// Internal node structure: the task plus its immediate edges as indices
/// into `DependencyGraph::nodes`.
#[derive(Debug, Clone)]
struct GraphNode {
    task: TaskDefinition,
    /// Direct dependencies, in the order the catalog lists them.
    deps: Vec<usize>,
    /// Direct dependents, in catalog order.
    dependents: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Arena-backed dependency graph over a task catalog.
///
/// Node indices follow the input order of the catalog, which is what keeps
/// [`DependencyGraph::topological_order`] reproducible.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<TaskId, usize>,
}

impl DependencyGraph {
    /// Build the graph from a flat task list.
    ///
    /// Fails on duplicate ids, zero durations and dependencies that name a
    /// task absent from the list. Cycles are only detected by
    /// [`DependencyGraph::topological_order`].
    pub fn from_tasks(tasks: &[TaskDefinition]) -> Result<Self> {
        let mut index: HashMap<TaskId, usize> = HashMap::with_capacity(tasks.len());

        for (i, task) in tasks.iter().enumerate() {
            if task.duration_days == 0 {
                return Err(PipelineError::InvalidDuration {
                    task: task.id.clone(),
                    days: task.duration_days,
                });
            }
            if index.insert(task.id.clone(), i).is_some() {
                return Err(PipelineError::DuplicateTask(task.id.clone()));
            }
        }

        let mut nodes: Vec<GraphNode> = tasks
            .iter()
            .map(|task| GraphNode {
                task: task.clone(),
                deps: Vec::with_capacity(task.dependencies.len()),
                dependents: Vec::new(),
            })
            .collect();

        for (i, task) in tasks.iter().enumerate() {
            for dep in &task.dependencies {
                let &dep_idx = index.get(dep).ok_or_else(|| PipelineError::DanglingReference {
                    task: task.id.clone(),
                    missing: dep.clone(),
                })?;

                // A dependency listed twice is still one edge.
                if nodes[i].deps.contains(&dep_idx) {
                    continue;
                }
                nodes[i].deps.push(dep_idx);
                nodes[dep_idx].dependents.push(i);
            }
        }

        debug!(tasks = nodes.len(), "dependency graph built");
        Ok(Self { nodes, index })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn task(&self, idx: usize) -> &TaskDefinition {
        &self.nodes[idx].task
    }

    /// Immediate dependencies of the node at `idx`.
    pub fn dependencies_of(&self, idx: usize) -> &[usize] {
        &self.nodes[idx].deps
    }

    /// Immediate dependents of the node at `idx`.
    pub fn dependents_of(&self, idx: usize) -> &[usize] {
        &self.nodes[idx].dependents
    }

    /// Topological order of node indices: every dependency precedes its
    /// dependents.
    ///
    /// Depth-first with an explicit stack. Roots are tried in input order and
    /// dependencies in listed order, and nodes are appended in post-order, so
    /// a fixed input always yields the same order. Re-entering a node that is
    /// still being visited is a cycle; the error names the tasks on it, in
    /// visiting order.
    pub fn topological_order(&self) -> Result<Vec<usize>> {
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        // (node, next dependency position to look at)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..self.nodes.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::Visiting;
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let (node, cursor) = *frame;

                match self.nodes[node].deps.get(cursor) {
                    Some(&dep) => {
                        frame.1 += 1;
                        match marks[dep] {
                            Mark::Unvisited => {
                                marks[dep] = Mark::Visiting;
                                stack.push((dep, 0));
                            }
                            Mark::Visiting => return Err(self.cycle_error(&stack, dep)),
                            Mark::Done => {}
                        }
                    }
                    None => {
                        stack.pop();
                        marks[node] = Mark::Done;
                        order.push(node);
                    }
                }
            }
        }

        Ok(order)
    }

    /// The cycle is the stack segment starting at the re-entered node.
    fn cycle_error(&self, stack: &[(usize, usize)], reentered: usize) -> PipelineError {
        let start = stack
            .iter()
            .position(|&(node, _)| node == reentered)
            .unwrap_or(0);

        let tasks: Vec<TaskId> = stack[start..]
            .iter()
            .map(|&(node, _)| self.nodes[node].task.id.clone())
            .collect();

        debug!(?tasks, "cycle detected while ordering tasks");
        PipelineError::Cycle { tasks }
    }
}
