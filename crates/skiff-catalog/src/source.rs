//! The recipe source contract.

use std::collections::BTreeMap;

use async_trait::async_trait;

use skiff_core::Recipe;

use crate::error::SourceError;

/// A provider of recipes: local bundle tree, remote catalog feed, or
/// any future variant. The composite aggregator depends only on this
/// contract.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// Human-readable source name, used in logs and recipe metadata.
    fn name(&self) -> &str;

    /// Load the full slug → recipe mapping for this source.
    async fn load_recipes(&self) -> Result<BTreeMap<String, Recipe>, SourceError>;

    /// Whether this source can detect deltas between loads.
    fn supports_updates(&self) -> bool {
        false
    }

    /// Report slugs that are new since the last load.
    async fn check_for_updates(&self) -> Result<Vec<String>, SourceError> {
        Err(SourceError::Unsupported(self.name().to_string()))
    }
}
