// src/engine/mod.rs

//! Async shell around the pure scheduler core.
//!
//! - [`clock`] supplies `now` to the parts that need a wall clock.
//! - [`case`] serializes all access to one `PipelineState` behind a lock
//!   and forwards emitted events over a channel.
//! - [`sweeper`] runs the escalation detector on a fixed interval.
//!
//! Subscribers (certificate issuance, notifications, escalation handling)
//! sit on the receiving end of the [`OutboundEvent`] channel.

use crate::detect::Escalation;
use crate::pipeline::PipelineEvent;

/// Events leaving the scheduler for external collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    Pipeline(PipelineEvent),
    Escalation(Escalation),
}

pub mod case;
pub mod clock;
pub mod sweeper;

pub use case::CaseHandle;
pub use clock::{Clock, FixedClock, SystemClock};
pub use sweeper::EscalationSweeper;
