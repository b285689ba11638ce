// src/detect/escalation.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::pipeline::{PipelineState, TaskInstance};
use crate::types::{EscalationReason, Severity, TaskId};

pub const DEFAULT_ESCALATION_THRESHOLD_DAYS: u64 = 5;

/// A task at schedule risk, for external handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    pub case_id: String,
    pub task_id: TaskId,
    pub reason: EscalationReason,
    pub severity: Severity,
    pub detected_at: DateTime<Utc>,
}

/// Classify one task at `now`.
///
/// A breach (more days elapsed than the SLA allows, not yet terminal) wins
/// over an approaching SLA (in progress or under review with
/// `days_remaining <= threshold_days`).
pub fn classify_task(
    task: &ScheduledTask,
    instance: &TaskInstance,
    now: DateTime<Utc>,
    threshold_days: u64,
) -> Option<EscalationReason> {
    if instance.status.is_terminal() {
        return None;
    }

    let duration = task.duration_days();
    if instance.days_elapsed(now) > duration {
        return Some(EscalationReason::SlaBreached);
    }

    if instance.status.is_active() && instance.days_remaining(duration, now) <= threshold_days {
        return Some(EscalationReason::ApproachingSla);
    }

    None
}

/// Every task currently at risk, in blueprint order. Stateless: the same
/// task is reported on each call for as long as it stays at risk.
pub fn detect_escalations(
    state: &PipelineState,
    now: DateTime<Utc>,
    threshold_days: u64,
) -> Vec<Escalation> {
    state
        .iter()
        .filter_map(|(task, instance)| {
            classify_task(task, instance, now, threshold_days).map(|reason| Escalation {
                case_id: state.case_id().to_string(),
                task_id: task.definition.id.clone(),
                reason,
                severity: reason.severity(),
                detected_at: now,
            })
        })
        .collect()
}

/// Key for "already reported": the same task resubmitted later (new
/// `started_at`) is a new instance.
type ReportKey = (String, TaskId, Option<DateTime<Utc>>);

/// Deduplicating detector.
///
/// Remembers the most urgent reason already emitted per task instance and
/// only emits again when the reason gets worse (approaching -> breached).
/// Reads pipeline state, never mutates it.
#[derive(Debug, Clone)]
pub struct EscalationDetector {
    threshold_days: u64,
    last_escalated: HashMap<ReportKey, EscalationReason>,
}

impl Default for EscalationDetector {
    fn default() -> Self {
        Self::new(DEFAULT_ESCALATION_THRESHOLD_DAYS)
    }
}

impl EscalationDetector {
    pub fn new(threshold_days: u64) -> Self {
        Self {
            threshold_days,
            last_escalated: HashMap::new(),
        }
    }

    pub fn threshold_days(&self) -> u64 {
        self.threshold_days
    }

    /// Number of task instances currently remembered as escalated.
    pub fn tracked_count(&self) -> usize {
        self.last_escalated.len()
    }

    /// New escalations for `state` at `now`.
    ///
    /// Entries for tasks of this case that have since finished or been
    /// resubmitted are forgotten first.
    pub fn detect(&mut self, state: &PipelineState, now: DateTime<Utc>) -> Vec<Escalation> {
        self.forget_settled(state);
        let mut emitted = Vec::new();

        for escalation in detect_escalations(state, now, self.threshold_days) {
            let started_at = state
                .instance(&escalation.task_id)
                .ok()
                .and_then(|i| i.started_at);
            let key = (
                escalation.case_id.clone(),
                escalation.task_id.clone(),
                started_at,
            );

            match self.last_escalated.get(&key) {
                Some(&previous) if previous >= escalation.reason => {
                    debug!(
                        case = %escalation.case_id,
                        task = %escalation.task_id,
                        reason = %escalation.reason,
                        "already escalated; skipping"
                    );
                }
                _ => {
                    info!(
                        case = %escalation.case_id,
                        task = %escalation.task_id,
                        reason = %escalation.reason,
                        severity = %escalation.severity,
                        "escalation raised"
                    );
                    self.last_escalated.insert(key, escalation.reason);
                    emitted.push(escalation);
                }
            }
        }

        emitted
    }

    fn forget_settled(&mut self, state: &PipelineState) {
        let before = self.last_escalated.len();
        self.last_escalated.retain(|(case_id, task_id, started_at), _| {
            if case_id != state.case_id() {
                return true;
            }
            match state.instance(task_id) {
                Ok(instance) => {
                    !instance.status.is_terminal() && instance.started_at == *started_at
                }
                Err(_) => false,
            }
        });

        let dropped = before - self.last_escalated.len();
        if dropped > 0 {
            debug!(case = %state.case_id(), dropped, "forgot settled escalations");
        }
    }
}
