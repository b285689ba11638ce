// src/catalog/validate.rs

use crate::catalog::model::{CatalogFile, RawCatalogFile};
use crate::dag::build_blueprint;
use crate::errors::{PipelineError, Result};

impl TryFrom<RawCatalogFile> for CatalogFile {
    type Error = PipelineError;

    fn try_from(raw: RawCatalogFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_tasks(&raw)?;
        validate_task_fields(&raw)?;

        // Duplicate ids, dangling references and cycles are all reported
        // by the graph builder itself.
        let blueprint = build_blueprint(&raw.tasks)?;
        Ok(CatalogFile::new_unchecked(raw.config, raw.tasks, blueprint))
    }
}

fn ensure_has_tasks(cfg: &RawCatalogFile) -> Result<()> {
    if cfg.tasks.is_empty() {
        return Err(PipelineError::EmptyCatalog);
    }
    Ok(())
}

fn validate_task_fields(cfg: &RawCatalogFile) -> Result<()> {
    for task in &cfg.tasks {
        if task.id.trim().is_empty() {
            return Err(PipelineError::ConfigError(
                "every [[task]] needs a non-empty `id`".to_string(),
            ));
        }
        if task.requirements.iter().any(|r| r.trim().is_empty()) {
            return Err(PipelineError::ConfigError(format!(
                "task '{}' lists an empty requirement name",
                task.id
            )));
        }
    }
    Ok(())
}
