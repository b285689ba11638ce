// src/detect/mod.rs

//! Bottleneck and SLA-breach detection over live pipeline state.

pub mod escalation;

pub use escalation::{
    DEFAULT_ESCALATION_THRESHOLD_DAYS, Escalation, EscalationDetector, classify_task,
    detect_escalations,
};
