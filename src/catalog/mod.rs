// src/catalog/mod.rs

//! Task catalog and case files.
//!
//! The catalog is the static registry of approval services handed to the
//! scheduler; case files record the status history of one investor case.

pub mod case;
pub mod loader;
pub mod model;
pub mod validate;

pub use case::{CaseAction, CaseEvent, CaseFile, RawCaseFile, UploadEntry};
pub use loader::{load_and_validate, load_case, load_from_path};
pub use model::{CatalogFile, CatalogSection, RawCatalogFile, TaskDefinition};
