// src/catalog/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::catalog::case::{CaseFile, RawCaseFile};
use crate::catalog::model::{CatalogFile, RawCatalogFile};
use crate::errors::Result;

/// Deserialize a catalog file without any semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawCatalogFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let catalog: RawCatalogFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), tasks = catalog.tasks.len(), "catalog parsed");

    Ok(catalog)
}

/// Load a catalog and build its blueprint.
///
/// Fails on an empty catalog, zero durations, duplicate ids, unknown
/// dependencies or dependency cycles. On success the blueprint is ready to
/// be shared across cases via [`CatalogFile::blueprint`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<CatalogFile> {
    let raw = load_from_path(&path)?;
    CatalogFile::try_from(raw)
}

/// Load a case-event file (see [`crate::catalog::case`]).
pub fn load_case(path: impl AsRef<Path>) -> Result<CaseFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawCaseFile = toml::from_str(&contents)?;
    CaseFile::try_from(raw)
}
