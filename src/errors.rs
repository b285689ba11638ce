// src/errors.rs

//! Crate-wide error enum and `Result` alias.
//!
//! Catalog/structural errors (`Cycle`, `DanglingReference`, ...) are fatal to
//! blueprint construction. State errors (`Prerequisite`, `InvalidTransition`,
//! `UnknownTask`) are recoverable and always leave the pipeline untouched.

use thiserror::Error;

use crate::types::{TaskId, TaskStatus};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Cycle detected in task catalog: {}", .tasks.join(" -> "))]
    Cycle { tasks: Vec<TaskId> },

    #[error("Task '{task}' depends on unknown task '{missing}'")]
    DanglingReference { task: TaskId, missing: TaskId },

    #[error("Duplicate task id in catalog: {0}")]
    DuplicateTask(TaskId),

    #[error("Task '{task}' has invalid duration {days} (must be >= 1 day)")]
    InvalidDuration { task: TaskId, days: u32 },

    #[error("Task catalog is empty")]
    EmptyCatalog,

    #[error("Cannot start '{task}': waiting on {}", .blocking.join(", "))]
    Prerequisite { task: TaskId, blocking: Vec<TaskId> },

    #[error("Invalid transition for '{task}': {from} -> {to}")]
    InvalidTransition {
        task: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Task not found: {0}")]
    UnknownTask(TaskId),

    #[error("Inconsistent pipeline data: {0}")]
    InconsistentState(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
