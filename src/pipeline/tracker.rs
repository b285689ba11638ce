// src/pipeline/tracker.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dag::{PipelineBlueprint, ScheduledTask};
use crate::errors::{PipelineError, Result};
use crate::pipeline::instance::TaskInstance;
use crate::types::{TaskId, TaskStatus};

/// Events emitted by status changes, for external subscribers
/// (certificate issuance, notifications). The tracker itself does no I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineEvent {
    TaskApproved {
        case_id: String,
        task_id: TaskId,
        approved_at: DateTime<Utc>,
    },
    TaskBlocked {
        case_id: String,
        task_id: TaskId,
        at: DateTime<Utc>,
    },
}

/// Structured result of a single accepted status change.
#[derive(Debug, Clone)]
pub struct StatusStep {
    pub task_id: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
    /// Dependents moved to `blocked` because this task was rejected.
    pub newly_blocked: Vec<TaskId>,
    pub events: Vec<PipelineEvent>,
}

impl StatusStep {
    /// `true` for an idempotent call that changed nothing.
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.events.is_empty()
    }
}

/// Derived per-task view returned by [`PipelineState::query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub days_elapsed: u64,
    pub days_remaining: u64,
    pub earliest_start: u64,
    pub earliest_finish: u64,
    pub is_on_critical_path: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub case_id: String,
    /// In blueprint (topological) order.
    pub tasks: Vec<TaskSnapshot>,
    pub completed_count: usize,
    pub overall_progress_percent: f64,
    pub critical_path_ids: Vec<TaskId>,
    pub total_duration_days: u64,
}

/// Live state of one investor case.
///
/// Owned by the caller and mutated only through `&mut self`, so all updates
/// for a case are serialized by construction. Instances are stored in
/// blueprint order and addressed by blueprint position; a persisted state
/// whose instances do not line up with its blueprint is rejected on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPipelineState")]
pub struct PipelineState {
    case_id: String,
    blueprint: Arc<PipelineBlueprint>,
    instances: Vec<TaskInstance>,
}

/// Persisted form of a [`PipelineState`], before instances are matched up
/// with blueprint positions.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipelineState {
    pub case_id: String,
    pub blueprint: Arc<PipelineBlueprint>,
    pub instances: Vec<TaskInstance>,
}

impl TryFrom<RawPipelineState> for PipelineState {
    type Error = PipelineError;

    fn try_from(raw: RawPipelineState) -> std::result::Result<Self, Self::Error> {
        if raw.instances.len() != raw.blueprint.len() {
            return Err(PipelineError::InconsistentState(format!(
                "case '{}' has {} task instances for a blueprint of {} tasks",
                raw.case_id,
                raw.instances.len(),
                raw.blueprint.len()
            )));
        }

        let misplaced = raw
            .blueprint
            .tasks()
            .iter()
            .zip(&raw.instances)
            .find(|(task, instance)| task.id() != instance.task_id);
        if let Some((task, instance)) = misplaced {
            return Err(PipelineError::InconsistentState(format!(
                "case '{}' stores '{}' where the blueprint expects '{}'",
                raw.case_id,
                instance.task_id,
                task.id()
            )));
        }

        Ok(Self {
            case_id: raw.case_id,
            blueprint: raw.blueprint,
            instances: raw.instances,
        })
    }
}

/// Create a fresh pipeline for a case: every task `not-started`.
pub fn instantiate_pipeline(
    blueprint: Arc<PipelineBlueprint>,
    case_id: impl Into<String>,
) -> PipelineState {
    PipelineState::new(blueprint, case_id)
}

impl PipelineState {
    pub fn new(blueprint: Arc<PipelineBlueprint>, case_id: impl Into<String>) -> Self {
        let instances = blueprint
            .tasks()
            .iter()
            .map(|task| TaskInstance::new(task.definition.id.clone()))
            .collect();

        let case_id = case_id.into();
        debug!(case = %case_id, tasks = blueprint.len(), "pipeline instantiated");

        Self {
            case_id,
            blueprint,
            instances,
        }
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn blueprint(&self) -> &Arc<PipelineBlueprint> {
        &self.blueprint
    }

    pub fn instance(&self, task_id: &str) -> Result<&TaskInstance> {
        let pos = self.position(task_id)?;
        Ok(&self.instances[pos])
    }

    pub fn status(&self, task_id: &str) -> Result<TaskStatus> {
        Ok(self.instance(task_id)?.status)
    }

    /// Scheduled tasks paired with their live instances, in blueprint order.
    pub fn iter(&self) -> impl Iterator<Item = (&ScheduledTask, &TaskInstance)> {
        self.blueprint.tasks().iter().zip(self.instances.iter())
    }

    /// Start a task.
    ///
    /// Fails with `Prerequisite` unless every dependency is `approved`.
    /// Starting a task that is already in progress is a no-op; `started_at`
    /// is only ever set once per submission.
    pub fn start_task(&mut self, task_id: &str, now: DateTime<Utc>) -> Result<StatusStep> {
        let pos = self.position(task_id)?;

        let blocking = self.unapproved_dependencies(pos);
        if !blocking.is_empty() {
            debug!(
                case = %self.case_id,
                task = %task_id,
                ?blocking,
                "start rejected; prerequisites not approved"
            );
            return Err(PipelineError::Prerequisite {
                task: task_id.to_string(),
                blocking,
            });
        }

        let from = self.instances[pos].status;
        if from == TaskStatus::InProgress {
            return Ok(self.noop_step(pos));
        }
        if !from.allows_transition(TaskStatus::InProgress) {
            return Err(self.invalid_transition(pos, TaskStatus::InProgress));
        }

        let instance = &mut self.instances[pos];
        instance.status = TaskStatus::InProgress;
        if instance.started_at.is_none() {
            instance.started_at = Some(now);
        }

        info!(case = %self.case_id, task = %task_id, %from, "task started");

        Ok(StatusStep {
            task_id: task_id.to_string(),
            from,
            to: TaskStatus::InProgress,
            newly_blocked: Vec::new(),
            events: Vec::new(),
        })
    }

    /// Move a task to `to`.
    ///
    /// `in-progress` goes through [`PipelineState::start_task`] so the
    /// prerequisite gate always applies. Started tasks only end up `blocked`
    /// through an upstream rejection, never by a direct call. Everything is validated before anything is written; on error the
    /// state is unchanged.
    pub fn set_status(
        &mut self,
        task_id: &str,
        to: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<StatusStep> {
        if to == TaskStatus::InProgress {
            return self.start_task(task_id, now);
        }

        let pos = self.position(task_id)?;
        let from = self.instances[pos].status;

        if !from.allows_transition(to) {
            return Err(self.invalid_transition(pos, to));
        }

        let mut events = Vec::new();
        let mut newly_blocked = Vec::new();

        {
            let instance = &mut self.instances[pos];
            instance.status = to;

            match to {
                TaskStatus::Approved => {
                    instance.completed_at = Some(now);
                    events.push(PipelineEvent::TaskApproved {
                        case_id: self.case_id.clone(),
                        task_id: task_id.to_string(),
                        approved_at: now,
                    });
                }
                TaskStatus::Rejected => {
                    instance.completed_at = Some(now);
                }
                TaskStatus::NotStarted => {
                    instance.started_at = None;
                    instance.completed_at = None;
                }
                TaskStatus::Blocked => {
                    events.push(PipelineEvent::TaskBlocked {
                        case_id: self.case_id.clone(),
                        task_id: task_id.to_string(),
                        at: now,
                    });
                }
                TaskStatus::InProgress | TaskStatus::UnderReview | TaskStatus::OnHold => {}
            }
        }

        if to == TaskStatus::Rejected {
            newly_blocked = self.block_dependents(pos, now, &mut events);
        }

        info!(case = %self.case_id, task = %task_id, %from, %to, "task status changed");

        Ok(StatusStep {
            task_id: task_id.to_string(),
            from,
            to,
            newly_blocked,
            events,
        })
    }

    pub fn days_elapsed(&self, task_id: &str, now: DateTime<Utc>) -> Result<u64> {
        Ok(self.instance(task_id)?.days_elapsed(now))
    }

    pub fn days_remaining(&self, task_id: &str, now: DateTime<Utc>) -> Result<u64> {
        let pos = self.position(task_id)?;
        let duration = self.blueprint.tasks()[pos].duration_days();
        Ok(self.instances[pos].days_remaining(duration, now))
    }

    /// Number of approved tasks.
    pub fn completed_count(&self) -> usize {
        self.instances
            .iter()
            .filter(|i| i.status == TaskStatus::Approved)
            .count()
    }

    /// Approved share of all tasks, `0.0` for an empty pipeline.
    pub fn overall_progress_percent(&self) -> f64 {
        if self.instances.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.instances.len() as f64 * 100.0
    }

    /// Everything derived at `now`, recomputed on each call.
    pub fn query(&self, now: DateTime<Utc>) -> PipelineSnapshot {
        let tasks = self
            .iter()
            .map(|(task, instance)| TaskSnapshot {
                task_id: task.definition.id.clone(),
                status: instance.status,
                days_elapsed: instance.days_elapsed(now),
                days_remaining: instance.days_remaining(task.duration_days(), now),
                earliest_start: task.earliest_start,
                earliest_finish: task.earliest_finish,
                is_on_critical_path: task.is_on_critical_path,
            })
            .collect();

        PipelineSnapshot {
            case_id: self.case_id.clone(),
            tasks,
            completed_count: self.completed_count(),
            overall_progress_percent: self.overall_progress_percent(),
            critical_path_ids: self.blueprint.critical_path_ids().to_vec(),
            total_duration_days: self.blueprint.total_duration_days(),
        }
    }

    /// Record an uploaded document for a task. Not part of scheduling.
    pub fn record_upload(&mut self, task_id: &str, requirement: &str) -> Result<()> {
        let pos = self.position(task_id)?;
        if !self.blueprint.tasks()[pos]
            .definition
            .requirements
            .iter()
            .any(|r| r == requirement)
        {
            debug!(task = %task_id, requirement, "upload for a requirement the catalog does not list");
        }
        self.instances[pos]
            .uploaded_requirements
            .insert(requirement.to_string());
        Ok(())
    }

    /// Catalog requirements not uploaded yet, in catalog order.
    pub fn missing_requirements(&self, task_id: &str) -> Result<Vec<String>> {
        let pos = self.position(task_id)?;
        let uploaded = &self.instances[pos].uploaded_requirements;
        Ok(self.blueprint.tasks()[pos]
            .definition
            .requirements
            .iter()
            .filter(|r| !uploaded.contains(*r))
            .cloned()
            .collect())
    }

    fn position(&self, task_id: &str) -> Result<usize> {
        self.blueprint
            .position(task_id)
            .ok_or_else(|| PipelineError::UnknownTask(task_id.to_string()))
    }

    fn unapproved_dependencies(&self, pos: usize) -> Vec<TaskId> {
        self.blueprint.tasks()[pos]
            .dependency_positions
            .iter()
            .filter(|&&dep| self.instances[dep].status != TaskStatus::Approved)
            .map(|&dep| self.instances[dep].task_id.clone())
            .collect()
    }

    /// Block every non-terminal, not-yet-blocked task downstream of `root`.
    fn block_dependents(
        &mut self,
        root: usize,
        now: DateTime<Utc>,
        events: &mut Vec<PipelineEvent>,
    ) -> Vec<TaskId> {
        let blueprint = Arc::clone(&self.blueprint);
        let mut stack: Vec<usize> = blueprint.tasks()[root].dependent_positions.clone();
        let mut newly_blocked = Vec::new();

        while let Some(pos) = stack.pop() {
            let instance = &mut self.instances[pos];
            if instance.status.is_terminal() || instance.status == TaskStatus::Blocked {
                continue;
            }

            instance.status = TaskStatus::Blocked;
            warn!(
                case = %self.case_id,
                task = %instance.task_id,
                upstream = %blueprint.tasks()[root].id(),
                "blocking dependent after upstream rejection"
            );
            events.push(PipelineEvent::TaskBlocked {
                case_id: self.case_id.clone(),
                task_id: instance.task_id.clone(),
                at: now,
            });
            newly_blocked.push(instance.task_id.clone());
            stack.extend(blueprint.tasks()[pos].dependent_positions.iter().copied());
        }

        newly_blocked
    }

    fn noop_step(&self, pos: usize) -> StatusStep {
        let status = self.instances[pos].status;
        StatusStep {
            task_id: self.instances[pos].task_id.clone(),
            from: status,
            to: status,
            newly_blocked: Vec::new(),
            events: Vec::new(),
        }
    }

    fn invalid_transition(&self, pos: usize, to: TaskStatus) -> PipelineError {
        PipelineError::InvalidTransition {
            task: self.instances[pos].task_id.clone(),
            from: self.instances[pos].status,
            to,
        }
    }
}
