// src/engine/case.rs

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::{Error, PipelineError, Result};
use crate::pipeline::{PipelineEvent, PipelineState, StatusStep};
use crate::types::TaskStatus;

use super::OutboundEvent;

/// Shared handle to one case.
///
/// The `PipelineState` sits behind a single lock, so a status change and the
/// prerequisite check it depends on never interleave with another update of
/// the same case. The lock is released before emitted events are forwarded.
#[derive(Debug, Clone)]
pub struct CaseHandle {
    state: Arc<Mutex<PipelineState>>,
    events_tx: mpsc::Sender<OutboundEvent>,
}

impl CaseHandle {
    pub fn new(state: PipelineState, events_tx: mpsc::Sender<OutboundEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            events_tx,
        }
    }

    pub async fn start_task(&self, task_id: &str, now: DateTime<Utc>) -> Result<StatusStep> {
        let step = self.lock()?.start_task(task_id, now)?;
        self.forward(&step.events).await?;
        Ok(step)
    }

    pub async fn set_status(
        &self,
        task_id: &str,
        to: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<StatusStep> {
        let step = self.lock()?.set_status(task_id, to, now)?;
        self.forward(&step.events).await?;
        Ok(step)
    }

    /// Run a read-only closure against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&PipelineState) -> R) -> Result<R> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    pub(crate) fn events_tx(&self) -> &mpsc::Sender<OutboundEvent> {
        &self.events_tx
    }

    fn lock(&self) -> Result<MutexGuard<'_, PipelineState>> {
        self.state.lock().map_err(|_| {
            PipelineError::Other(anyhow::anyhow!("case state lock poisoned"))
        })
    }

    async fn forward(&self, events: &[PipelineEvent]) -> Result<()> {
        for event in events {
            debug!(?event, "forwarding pipeline event");
            self.events_tx
                .send(OutboundEvent::Pipeline(event.clone()))
                .await
                .map_err(Error::from)?;
        }
        Ok(())
    }
}
