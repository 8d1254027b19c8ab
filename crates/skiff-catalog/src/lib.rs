//! skiff-catalog — recipe ingestion and validation for Skiff.
//!
//! Recipes arrive from N independently-evolving sources (local bundle
//! trees, a remote third-party feed) and are merged into one catalog:
//!
//! ```text
//! LocalSource ─┐
//! RemoteCatalogSource ─┤→ CompositeSource (merge, atomic cache swap)
//!              ...    ─┘        │
//!                               ▼
//!                        RecipeLoader (per-recipe validation,
//!                        queryable catalog, reload, update check)
//! ```
//!
//! A failing source or a malformed recipe never aborts a load; it is
//! skipped with a warning so a partial catalog beats no catalog.
//! Recipes that parse but fail structural validation are dropped at
//! the loader boundary.

pub mod composite;
pub mod error;
pub mod loader;
pub mod local;
pub mod remote;
pub mod source;
pub mod validator;

pub use composite::{CompositeSource, SourceUpdates};
pub use error::{CatalogError, CatalogResult, SourceError};
pub use loader::RecipeLoader;
pub use local::LocalSource;
pub use remote::RemoteCatalogSource;
pub use source::RecipeSource;
