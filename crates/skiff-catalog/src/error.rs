//! Catalog error types.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors surfaced by catalog queries.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("recipe not found: {0}")]
    NotFound(String),

    #[error("recipe '{slug}' failed validation: {reason}")]
    Invalid { slug: String, reason: String },
}

/// Errors a single recipe source can produce. These are absorbed at
/// the composite boundary and never fail a full catalog load.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source fetch failed: {0}")]
    Fetch(String),

    #[error("source '{0}' does not support update detection")]
    Unsupported(String),
}
