//! Composite recipe source — aggregates N sources into one catalog.
//!
//! Sources are consulted in fixed registration order. A failing source
//! is logged and skipped; it never aborts the pass (partial
//! availability beats total failure). When two sources emit the same
//! slug, the later-registered source wins. The merged mapping replaces
//! the cache atomically: readers see either the old or the new
//! snapshot, never a partial merge.

use std::collections::BTreeMap;

use tokio::sync::RwLock;
use tracing::{info, warn};

use skiff_core::Recipe;

use crate::error::SourceError;
use crate::source::RecipeSource;

/// Per-source outcome of an update check.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUpdates {
    pub source: String,
    pub new_slugs: Vec<String>,
}

/// Aggregates registered sources and owns the authoritative in-memory
/// recipe cache.
pub struct CompositeSource {
    sources: Vec<Box<dyn RecipeSource>>,
    cache: RwLock<BTreeMap<String, Recipe>>,
}

impl CompositeSource {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            cache: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a source. Registration order is override order: recipes
    /// from later sources shadow earlier ones on slug collisions.
    pub fn register(mut self, source: Box<dyn RecipeSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run a full load pass over every source and swap the cache.
    ///
    /// All fetch I/O happens before the write lock is taken; the lock
    /// covers only the swap itself.
    pub async fn load_all(&self) -> BTreeMap<String, Recipe> {
        let mut merged: BTreeMap<String, Recipe> = BTreeMap::new();

        for source in &self.sources {
            match source.load_recipes().await {
                Ok(recipes) => {
                    info!(source = %source.name(), count = recipes.len(), "source loaded");
                    // Last write wins.
                    merged.extend(recipes);
                }
                Err(e) => {
                    warn!(source = %source.name(), error = %e, "source failed; skipping");
                }
            }
        }

        {
            let mut cache = self.cache.write().await;
            *cache = merged.clone();
        }

        merged
    }

    /// Read one recipe from the current snapshot.
    pub async fn get_recipe(&self, slug: &str) -> Option<Recipe> {
        self.cache.read().await.get(slug).cloned()
    }

    /// Clone the current snapshot.
    pub async fn snapshot(&self) -> BTreeMap<String, Recipe> {
        self.cache.read().await.clone()
    }

    /// Ask every update-capable source for its delta. Sources that
    /// cannot detect deltas are skipped; per-source failures are
    /// reported as empty with a warning.
    pub async fn check_for_updates(&self) -> Vec<SourceUpdates> {
        let mut results = Vec::new();
        for source in &self.sources {
            if !source.supports_updates() {
                continue;
            }
            match source.check_for_updates().await {
                Ok(new_slugs) => results.push(SourceUpdates {
                    source: source.name().to_string(),
                    new_slugs,
                }),
                Err(e) => {
                    warn!(source = %source.name(), error = %e, "update check failed");
                    results.push(SourceUpdates {
                        source: source.name().to_string(),
                        new_slugs: Vec::new(),
                    });
                }
            }
        }
        results
    }
}

impl Default for CompositeSource {
    fn default() -> Self {
        Self::new()
    }
}
