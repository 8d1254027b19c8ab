//! Recipe loader — drives composite loading and owns the validated
//! catalog.
//!
//! Load pipeline: composite load → per-recipe validation → drop any
//! recipe failing validation (logged, never fatal) → swap the
//! queryable catalog. All fetch and validation work happens before the
//! exclusive lock; the lock covers only the swap, so readers are never
//! starved by slow sources.

use std::collections::BTreeMap;

use tokio::sync::RwLock;
use tracing::{info, warn};

use skiff_core::Recipe;

use crate::composite::{CompositeSource, SourceUpdates};
use crate::error::{CatalogError, CatalogResult};
use crate::validator;

/// Holds the validated, queryable recipe catalog.
pub struct RecipeLoader {
    composite: CompositeSource,
    catalog: RwLock<BTreeMap<String, Recipe>>,
}

impl RecipeLoader {
    pub fn new(composite: CompositeSource) -> Self {
        Self {
            composite,
            catalog: RwLock::new(BTreeMap::new()),
        }
    }

    /// Run the full load pipeline. Returns the number of recipes that
    /// made it into the catalog.
    pub async fn load(&self) -> usize {
        let merged = self.composite.load_all().await;
        let total = merged.len();

        let mut validated = BTreeMap::new();
        for (slug, recipe) in merged {
            match validator::ensure_valid(&recipe) {
                Ok(()) => {
                    validated.insert(slug, recipe);
                }
                Err(e) => {
                    warn!(%slug, error = %e, "dropping invalid recipe");
                }
            }
        }

        let count = validated.len();
        {
            let mut catalog = self.catalog.write().await;
            *catalog = validated;
        }

        info!(loaded = count, dropped = total - count, "recipe catalog swapped");
        count
    }

    /// Re-run the whole pipeline, replacing the catalog.
    pub async fn reload(&self) -> usize {
        self.load().await
    }

    /// Get one recipe by slug.
    pub async fn get(&self, slug: &str) -> CatalogResult<Recipe> {
        self.catalog
            .read()
            .await
            .get(slug)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(slug.to_string()))
    }

    /// List every recipe in the catalog.
    pub async fn list(&self) -> Vec<Recipe> {
        self.catalog.read().await.values().cloned().collect()
    }

    /// List recipes in a category; an empty category means all.
    pub async fn list_by_category(&self, category: &str) -> Vec<Recipe> {
        if category.is_empty() {
            return self.list().await;
        }
        self.catalog
            .read()
            .await
            .values()
            .filter(|r| r.category == category)
            .cloned()
            .collect()
    }

    /// Distinct categories, sorted.
    pub async fn categories(&self) -> Vec<String> {
        let catalog = self.catalog.read().await;
        catalog
            .values()
            .map(|r| r.category.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Delegate the update check to the composite, per source.
    pub async fn check_for_updates(&self) -> Vec<SourceUpdates> {
        self.composite.check_for_updates().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::tests::{GatedSource, StaticSource, recipe};
    use std::sync::Arc;

    fn loader_with(recipes: &[Recipe]) -> RecipeLoader {
        RecipeLoader::new(
            CompositeSource::new().register(Box::new(StaticSource::serving("test", recipes))),
        )
    }

    #[tokio::test]
    async fn load_then_query_by_slug() {
        let loader = loader_with(&[recipe("ghost", "test"), recipe("gitea", "test")]);
        assert_eq!(loader.load().await, 2);

        let got = loader.get("ghost").await.unwrap();
        assert_eq!(got.slug, "ghost");
        assert!(matches!(
            loader.get("nope").await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_recipe_is_dropped_without_failing_load() {
        let mut broken = recipe("broken", "test");
        broken.template = "no services here".to_string();
        let loader = loader_with(&[recipe("fine", "test"), broken]);

        assert_eq!(loader.load().await, 1);
        assert!(loader.get("fine").await.is_ok());
        assert!(loader.get("broken").await.is_err());
    }

    #[tokio::test]
    async fn list_by_category_filters_and_empty_means_all() {
        let mut media = recipe("jellyfin", "test");
        media.category = "media".to_string();
        let loader = loader_with(&[recipe("gitea", "test"), media]);
        loader.load().await;

        assert_eq!(loader.list_by_category("media").await.len(), 1);
        assert_eq!(loader.list_by_category("").await.len(), 2);
        assert!(loader.list_by_category("games").await.is_empty());
    }

    #[tokio::test]
    async fn categories_are_distinct_and_sorted() {
        let mut a = recipe("a", "test");
        a.category = "media".to_string();
        let mut b = recipe("b", "test");
        b.category = "devtools".to_string();
        let loader = loader_with(&[a, b, recipe("c", "test")]);
        loader.load().await;

        assert_eq!(loader.categories().await, vec!["devtools", "media", "test"]);
    }

    #[tokio::test]
    async fn reload_replaces_catalog() {
        let loader = loader_with(&[recipe("only", "test")]);
        loader.load().await;
        assert_eq!(loader.list().await.len(), 1);

        // Same source answer; the catalog is rebuilt, not appended.
        loader.reload().await;
        assert_eq!(loader.list().await.len(), 1);
    }

    #[tokio::test]
    async fn queries_during_reload_see_old_catalog_whole() {
        let gated = GatedSource::serving(&[recipe("old-a", "gated"), recipe("old-b", "gated")]);
        let recipes = gated.recipes.clone();
        let reached = gated.reached.clone();
        let release = gated.release.clone();

        let loader = Arc::new(RecipeLoader::new(
            CompositeSource::new().register(Box::new(gated)),
        ));

        let task = tokio::spawn({
            let loader = loader.clone();
            async move { loader.load().await }
        });
        reached.notified().await;
        release.notify_one();
        assert_eq!(task.await.unwrap(), 2);

        *recipes.lock().unwrap() = [recipe("new-only", "gated")]
            .into_iter()
            .map(|r| (r.slug.clone(), r))
            .collect();

        let task = tokio::spawn({
            let loader = loader.clone();
            async move { loader.reload().await }
        });
        reached.notified().await;

        // A reader mid-reload gets the full previous catalog.
        assert_eq!(loader.list().await.len(), 2);
        assert!(loader.get("old-a").await.is_ok());
        assert!(loader.get("new-only").await.is_err());

        release.notify_one();
        assert_eq!(task.await.unwrap(), 1);
        assert!(loader.get("new-only").await.is_ok());
        assert!(loader.get("old-a").await.is_err());
    }

    #[tokio::test]
    async fn queries_before_load_see_empty_catalog() {
        let loader = loader_with(&[recipe("x", "test")]);
        assert!(loader.list().await.is_empty());
        assert!(loader.get("x").await.is_err());
    }
}
