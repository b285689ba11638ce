// src/catalog/case.rs

//! Case-event files: a recorded history of status changes for one case,
//! replayed against a blueprint to reconstruct its `PipelineState`.
//!
//! ```toml
//! case_id = "INV-0042"
//!
//! [[upload]]
//! task = "trade-license"
//! requirement = "passport"
//!
//! [[event]]
//! task = "company-name"
//! action = "start"
//! at = "2026-01-05T09:00:00Z"
//!
//! [[event]]
//! task = "company-name"
//! action = "under-review"
//! at = "2026-01-06T09:00:00Z"
//! ```

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::dag::PipelineBlueprint;
use crate::errors::{PipelineError, Result};
use crate::pipeline::PipelineState;
use crate::types::{TaskId, TaskStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct RawCaseFile {
    pub case_id: String,

    #[serde(default, rename = "upload")]
    pub uploads: Vec<UploadEntry>,

    #[serde(default, rename = "event")]
    pub events: Vec<CaseEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadEntry {
    pub task: TaskId,
    pub requirement: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaseEvent {
    pub task: TaskId,
    pub action: CaseAction,
    pub at: DateTime<Utc>,
}

/// `"start"` or the name of a target status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum CaseAction {
    Start,
    SetStatus(TaskStatus),
}

impl TryFrom<String> for CaseAction {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        if value.trim().eq_ignore_ascii_case("start") {
            return Ok(CaseAction::Start);
        }
        TaskStatus::from_str(&value).map(CaseAction::SetStatus)
    }
}

/// Validated case file.
#[derive(Debug, Clone)]
pub struct CaseFile {
    pub case_id: String,
    pub uploads: Vec<UploadEntry>,
    pub events: Vec<CaseEvent>,
}

impl TryFrom<RawCaseFile> for CaseFile {
    type Error = PipelineError;

    fn try_from(raw: RawCaseFile) -> std::result::Result<Self, Self::Error> {
        if raw.case_id.trim().is_empty() {
            return Err(PipelineError::ConfigError(
                "case file needs a non-empty `case_id`".to_string(),
            ));
        }

        if let Some(pair) = raw.events.windows(2).find(|w| w[1].at < w[0].at) {
            return Err(PipelineError::ConfigError(format!(
                "case '{}': event for '{}' at {} is earlier than the event before it",
                raw.case_id, pair[1].task, pair[1].at
            )));
        }

        Ok(Self {
            case_id: raw.case_id,
            uploads: raw.uploads,
            events: raw.events,
        })
    }
}

impl CaseFile {
    /// Instantiate a pipeline for this case and apply every upload and event
    /// in file order. The first rejected event aborts the replay.
    pub fn replay(&self, blueprint: Arc<PipelineBlueprint>) -> Result<PipelineState> {
        let mut state = PipelineState::new(blueprint, self.case_id.clone());

        for upload in &self.uploads {
            state.record_upload(&upload.task, &upload.requirement)?;
        }

        for event in &self.events {
            let step = match event.action {
                CaseAction::Start => state.start_task(&event.task, event.at)?,
                CaseAction::SetStatus(to) => state.set_status(&event.task, to, event.at)?,
            };
            debug!(
                case = %self.case_id,
                task = %event.task,
                from = %step.from,
                to = %step.to,
                emitted = step.events.len(),
                "replayed case event"
            );
        }

        Ok(state)
    }
}
