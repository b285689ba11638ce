#![allow(dead_code)]

use std::sync::Arc;

use approvaldag::catalog::{CatalogFile, CatalogSection, RawCatalogFile, TaskDefinition};
use approvaldag::dag::{PipelineBlueprint, build_blueprint};
use approvaldag::types::TaskPriority;

/// Builder for catalogs to simplify test setup.
pub struct CatalogBuilder {
    catalog: RawCatalogFile,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            catalog: RawCatalogFile {
                config: CatalogSection::default(),
                tasks: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: TaskDefinition) -> Self {
        self.catalog.tasks.push(task);
        self
    }

    pub fn with_escalation_threshold(mut self, days: u64) -> Self {
        self.catalog.config.escalation_threshold_days = days;
        self
    }

    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.catalog.tasks
    }

    pub fn build_raw(self) -> RawCatalogFile {
        self.catalog
    }

    pub fn build(self) -> CatalogFile {
        CatalogFile::try_from(self.catalog).expect("Failed to build valid catalog from builder")
    }

    /// Shortcut straight to a shareable blueprint.
    pub fn blueprint(self) -> Arc<PipelineBlueprint> {
        Arc::new(build_blueprint(&self.catalog.tasks).expect("Failed to build blueprint"))
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskDefinition`.
pub struct TaskDefinitionBuilder {
    task: TaskDefinition,
}

impl TaskDefinitionBuilder {
    pub fn new(id: &str, duration_days: u32) -> Self {
        Self {
            task: TaskDefinition::new(id, duration_days),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.dependencies.push(dep.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.task.name = name.to_string();
        self
    }

    pub fn authority(mut self, authority: &str) -> Self {
        self.task.authority = authority.to_string();
        self
    }

    pub fn critical(mut self) -> Self {
        self.task.priority = TaskPriority::Critical;
        self
    }

    pub fn requirement(mut self, requirement: &str) -> Self {
        self.task.requirements.push(requirement.to_string());
        self
    }

    pub fn build(self) -> TaskDefinition {
        self.task
    }
}

/// Scenario catalog: A(3), B(5) after A, C(2) after A.
pub fn fan_out_catalog() -> CatalogBuilder {
    CatalogBuilder::new()
        .with_task(TaskDefinitionBuilder::new("A", 3).build())
        .with_task(TaskDefinitionBuilder::new("B", 5).after("A").build())
        .with_task(TaskDefinitionBuilder::new("C", 2).after("A").build())
}
