// src/engine/sweeper.rs

use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::detect::{Escalation, EscalationDetector};
use crate::errors::{Error, Result};

use super::OutboundEvent;
use super::case::CaseHandle;
use super::clock::Clock;

/// Periodic escalation sweep over one case.
///
/// Each sweep takes the case lock only long enough to read the state; new
/// escalations are then sent as [`OutboundEvent::Escalation`]. The sweeper
/// never changes task statuses.
#[derive(Debug)]
pub struct EscalationSweeper<C: Clock> {
    case: CaseHandle,
    detector: EscalationDetector,
    clock: C,
}

impl<C: Clock> EscalationSweeper<C> {
    pub fn new(case: CaseHandle, detector: EscalationDetector, clock: C) -> Self {
        Self {
            case,
            detector,
            clock,
        }
    }

    /// Run one detection pass and forward anything new.
    pub async fn sweep_once(&mut self) -> Result<Vec<Escalation>> {
        let now = self.clock.now();
        let detector = &mut self.detector;
        let escalations = self.case.read(|state| detector.detect(state, now))?;

        debug!(%now, new = escalations.len(), "escalation sweep finished");

        for escalation in &escalations {
            self.case
                .events_tx()
                .send(OutboundEvent::Escalation(escalation.clone()))
                .await
                .map_err(Error::from)?;
        }

        Ok(escalations)
    }

    /// Sweep every `period` until `shutdown` fires (or its sender is dropped).
    pub async fn run(mut self, period: Duration, mut shutdown: oneshot::Receiver<()>) -> Result<()> {
        info!(period_secs = period.as_secs(), "escalation sweeper started");
        let mut ticker = tokio::time::interval(period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once().await?;
                }
                _ = &mut shutdown => {
                    info!("escalation sweeper shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
