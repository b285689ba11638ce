// src/pipeline/mod.rs

//! Live pipeline tracking for a single case.
//!
//! - [`instance`] holds the mutable record of one task within a case.
//! - [`tracker`] owns all instances of a case, enforces the status machine
//!   and prerequisite gating, and answers time-based queries.

pub mod instance;
pub mod tracker;

pub use instance::TaskInstance;
pub use tracker::{
    PipelineEvent, PipelineSnapshot, PipelineState, RawPipelineState, StatusStep, TaskSnapshot,
    instantiate_pipeline,
};
