// src/catalog/model.rs

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dag::PipelineBlueprint;
use crate::types::{TaskId, TaskPriority};

/// Raw task catalog exactly as read from a TOML file.
///
/// ```toml
/// [config]
/// escalation_threshold_days = 5
///
/// [[task]]
/// id = "trade-license"
/// name = "Trade License"
/// authority = "Department of Economy"
/// duration_days = 3
/// dependencies = ["company-name"]
/// priority = "critical"
/// ```
///
/// Tasks are an array of tables so the file order is kept; blueprint
/// construction breaks ties by input position.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawCatalogFile {
    #[serde(default)]
    pub config: CatalogSection,

    #[serde(default, rename = "task")]
    pub tasks: Vec<TaskDefinition>,
}

/// Validated catalog together with the blueprint it produced.
///
/// Only obtainable through `TryFrom<RawCatalogFile>` (see
/// `catalog::validate`) or [`CatalogFile::new_unchecked`].
#[derive(Debug, Clone)]
pub struct CatalogFile {
    pub config: CatalogSection,
    pub tasks: Vec<TaskDefinition>,
    blueprint: Arc<PipelineBlueprint>,
}

impl CatalogFile {
    pub(crate) fn new_unchecked(
        config: CatalogSection,
        tasks: Vec<TaskDefinition>,
        blueprint: PipelineBlueprint,
    ) -> Self {
        Self {
            config,
            tasks,
            blueprint: Arc::new(blueprint),
        }
    }

    /// Shared, read-only blueprint for instantiating cases.
    pub fn blueprint(&self) -> Arc<PipelineBlueprint> {
        Arc::clone(&self.blueprint)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSection {
    /// Tasks in review with this many days (or fewer) left are reported as
    /// approaching their SLA.
    #[serde(default = "default_escalation_threshold_days")]
    pub escalation_threshold_days: u64,
}

fn default_escalation_threshold_days() -> u64 {
    crate::detect::DEFAULT_ESCALATION_THRESHOLD_DAYS
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            escalation_threshold_days: default_escalation_threshold_days(),
        }
    }
}

/// One approval service from the catalog (`[[task]]`).
///
/// Immutable input to the scheduler; nothing in this crate mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TaskDefinition {
    pub id: TaskId,

    #[serde(default)]
    pub name: String,

    /// Issuing authority, e.g. "Ministry of Interior".
    #[serde(default)]
    pub authority: String,

    /// Standard processing time assuming no delay. Must be >= 1.
    pub duration_days: u32,

    /// Tasks that must be approved before this one may start.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,

    #[serde(default)]
    pub priority: TaskPriority,

    /// Documents the applicant has to upload for this task.
    #[serde(default)]
    pub requirements: Vec<String>,
}

impl TaskDefinition {
    pub fn new(id: impl Into<TaskId>, duration_days: u32) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            authority: String::new(),
            duration_days,
            dependencies: Vec::new(),
            priority: TaskPriority::default(),
            requirements: Vec::new(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }
}
