//! Local recipe source — scans a directory tree of recipe bundles.
//!
//! Layout: one subdirectory per recipe, each holding a `recipe.toml`
//! manifest and a `compose.yaml` template body. A bundle that fails to
//! parse is skipped with a warning; it never fails the batch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use skiff_core::{
    ConfigOption, DatabaseSpec, HealthCheckSpec, Recipe, RecipeMetadata, ResourceRequirements,
};

use crate::error::SourceError;
use crate::source::RecipeSource;

const MANIFEST_FILE: &str = "recipe.toml";
const TEMPLATE_FILE: &str = "compose.yaml";

/// Reads recipe bundles from a directory on the local filesystem.
pub struct LocalSource {
    name: String,
    root: PathBuf,
}

/// The declarative half of a bundle, parsed from `recipe.toml`.
#[derive(Debug, Deserialize)]
struct BundleManifest {
    id: String,
    slug: String,
    name: String,
    category: String,
    description: String,
    #[serde(default)]
    tagline: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    options: Vec<ConfigOption>,
    resources: ResourceRequirements,
    health_check: HealthCheckSpec,
    #[serde(default)]
    database: DatabaseSpec,
    #[serde(default)]
    volumes: BTreeMap<String, String>,
}

impl LocalSource {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Parse one bundle directory into a recipe.
    fn read_bundle(&self, dir: &Path) -> anyhow::Result<Recipe> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let template_path = dir.join(TEMPLATE_FILE);

        let manifest_text = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("reading {}", manifest_path.display()))?;
        let manifest: BundleManifest = toml::from_str(&manifest_text)
            .with_context(|| format!("parsing {}", manifest_path.display()))?;
        let template = std::fs::read_to_string(&template_path)
            .with_context(|| format!("reading {}", template_path.display()))?;

        let updated_at = std::fs::metadata(&manifest_path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Ok(Recipe {
            id: manifest.id,
            slug: manifest.slug,
            name: manifest.name,
            category: manifest.category,
            description: manifest.description,
            tagline: manifest.tagline,
            icon: manifest.icon,
            options: manifest.options,
            resources: manifest.resources,
            health_check: manifest.health_check,
            database: manifest.database,
            template,
            volumes: manifest.volumes,
            metadata: RecipeMetadata {
                source: self.name.clone(),
                version: manifest.version,
                updated_at,
                verified: true,
                quality_score: 1.0,
            },
        })
    }
}

#[async_trait]
impl RecipeSource for LocalSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load_recipes(&self) -> Result<BTreeMap<String, Recipe>, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::Fetch(format!(
                "recipe directory does not exist: {}",
                self.root.display()
            )));
        }

        let mut recipes = BTreeMap::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_dir())
        {
            match self.read_bundle(entry.path()) {
                Ok(recipe) => {
                    debug!(source = %self.name, slug = %recipe.slug, "loaded recipe bundle");
                    recipes.insert(recipe.slug.clone(), recipe);
                }
                Err(e) => {
                    warn!(
                        source = %self.name,
                        bundle = %entry.path().display(),
                        error = %e,
                        "skipping malformed recipe bundle"
                    );
                }
            }
        }

        Ok(recipes)
    }
}
