// src/dag/mod.rs

//! Blueprint construction.
//!
//! - [`graph`] turns a flat task list into an arena-backed dependency graph
//!   and orders it topologically.
//! - [`critical_path`] runs the CPM forward pass and extracts the longest chain.
//! - [`parallel`] groups tasks sharing an earliest start.
//! - [`blueprint`] ties the three together into an immutable [`PipelineBlueprint`].

pub mod blueprint;
pub mod critical_path;
pub mod graph;
pub mod parallel;

pub use blueprint::{PipelineBlueprint, RawPipelineBlueprint, ScheduledTask, build_blueprint};
pub use critical_path::{CriticalPath, EarliestTimes, compute_critical_path};
pub use graph::DependencyGraph;
pub use parallel::{ParallelGroup, parallel_groups};
