use std::path::Path;

use lms_core::model::{Catalog, CatalogDraft};

use crate::error::CatalogError;

/// Catalog shipped with the app, used when no catalog file is configured.
pub const BUNDLED_CATALOG: &str = include_str!("../data/catalog.json");

/// Parse and validate a catalog JSON document.
///
/// # Errors
///
/// Returns `CatalogError::Parse` for malformed JSON and
/// `CatalogError::Invalid` when a course fails validation.
pub fn parse_catalog(json: &str) -> Result<Catalog, CatalogError> {
    let draft: CatalogDraft = serde_json::from_str(json)?;
    Ok(draft.validate()?)
}

/// # Errors
///
/// Returns `CatalogError` if the bundled document does not validate.
pub fn bundled_catalog() -> Result<Catalog, CatalogError> {
    parse_catalog(BUNDLED_CATALOG)
}

/// # Errors
///
/// Returns `CatalogError::Io` if the file cannot be read, otherwise as
/// [`parse_catalog`].
pub fn load_catalog_file(path: &Path) -> Result<Catalog, CatalogError> {
    let json = std::fs::read_to_string(path)?;
    parse_catalog(&json)
}
