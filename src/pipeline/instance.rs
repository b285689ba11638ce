// src/pipeline/instance.rs

//! Live per-case record of a single task.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{TaskId, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Requirement names uploaded so far. Bookkeeping only.
    pub uploaded_requirements: BTreeSet<String>,
}

impl TaskInstance {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            status: TaskStatus::NotStarted,
            started_at: None,
            completed_at: None,
            uploaded_requirements: BTreeSet::new(),
        }
    }

    /// Whole days since the task started, `0` if it has not.
    ///
    /// Once the task is completed the clock stops at `completed_at`.
    pub fn days_elapsed(&self, now: DateTime<Utc>) -> u64 {
        let Some(started) = self.started_at else {
            return 0;
        };
        let end = self.completed_at.unwrap_or(now);
        u64::try_from((end - started).num_days()).unwrap_or(0)
    }

    /// Days left against the SLA; `0` once completed or overdue.
    pub fn days_remaining(&self, duration_days: u64, now: DateTime<Utc>) -> u64 {
        if self.completed_at.is_some() {
            return 0;
        }
        duration_days.saturating_sub(self.days_elapsed(now))
    }
}
