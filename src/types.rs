use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical task identifier type used throughout the crate.
pub type TaskId = String;

/// Live status of a single task instance within a case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    UnderReview,
    Approved,
    Rejected,
    OnHold,
    Blocked,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 7] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::UnderReview,
        TaskStatus::Approved,
        TaskStatus::Rejected,
        TaskStatus::OnHold,
        TaskStatus::Blocked,
    ];

    /// `approved` and `rejected` end a task instance.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Approved | TaskStatus::Rejected)
    }

    /// Statuses in which the authority is actively working the task.
    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::InProgress | TaskStatus::UnderReview)
    }

    /// Unconditional edges of the status machine.
    ///
    /// Moving a started task to `blocked` is conditional on a dependency
    /// having regressed, so the tracker checks that edge itself.
    pub fn allows_transition(self, to: TaskStatus) -> bool {
        use TaskStatus::*;

        matches!(
            (self, to),
            (NotStarted, InProgress)
                | (NotStarted, Blocked)
                | (InProgress, UnderReview)
                | (InProgress, OnHold)
                | (InProgress, Rejected)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (UnderReview, OnHold)
                | (OnHold, InProgress)
                | (Blocked, NotStarted)
                | (Rejected, NotStarted)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not-started",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::UnderReview => "under-review",
            TaskStatus::Approved => "approved",
            TaskStatus::Rejected => "rejected",
            TaskStatus::OnHold => "on-hold",
            TaskStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "invalid task status: {s} (expected one of not-started, in-progress, \
                     under-review, approved, rejected, on-hold, blocked)"
                )
            })
    }
}

/// Agency-level criticality tag from the catalog.
///
/// Only used for filtering and highlighting; it never feeds the
/// longest-chain computation (see `ScheduledTask::is_on_critical_path`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Critical,
    #[default]
    Normal,
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(TaskPriority::Critical),
            "normal" => Ok(TaskPriority::Normal),
            other => Err(format!(
                "invalid priority: {other} (expected \"critical\" or \"normal\")"
            )),
        }
    }
}

/// Why a task was escalated. Ordered by urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    ApproachingSla,
    SlaBreached,
}

impl EscalationReason {
    pub fn severity(self) -> Severity {
        match self {
            EscalationReason::ApproachingSla => Severity::Medium,
            EscalationReason::SlaBreached => Severity::High,
        }
    }
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscalationReason::ApproachingSla => f.write_str("approaching_sla"),
            EscalationReason::SlaBreached => f.write_str("sla_breached"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Medium => f.write_str("medium"),
            Severity::High => f.write_str("high"),
        }
    }
}
