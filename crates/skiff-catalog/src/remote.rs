//! Remote catalog source — fetches a third-party template feed over
//! HTTP with a time-boxed on-disk cache.
//!
//! The feed is a JSON object keyed by slug; each entry packs its
//! template body as base64 and carries no resource metadata, so
//! requirements are estimated conservatively. A fresh cache file
//! (default window 24 h) short-circuits the network entirely; a failed
//! fetch falls back to whatever cache exists, however stale.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use skiff_core::{
    DatabaseSpec, HealthCheckSpec, Recipe, RecipeMetadata, ResourceRequirements,
};

use crate::error::SourceError;
use crate::source::RecipeSource;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const TAGLINE_MAX_CHARS: usize = 100;

/// One entry in the remote feed's native shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Base64-packed template body.
    pub template: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub min_version: String,
}

type Feed = BTreeMap<String, FeedEntry>;

/// Fetches the catalog feed from a fixed URL, caching it to one local
/// JSON file with modification-time freshness.
pub struct RemoteCatalogSource {
    name: String,
    url: String,
    cache_path: PathBuf,
    freshness: Duration,
}

impl RemoteCatalogSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        cache_path: impl Into<PathBuf>,
        freshness: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            cache_path: cache_path.into(),
            freshness,
        }
    }

    /// Whether the cache file exists and is inside the freshness window.
    fn cache_is_fresh(&self) -> bool {
        let Ok(meta) = std::fs::metadata(&self.cache_path) else {
            return false;
        };
        let Ok(modified) = meta.modified() else {
            return false;
        };
        SystemTime::now()
            .duration_since(modified)
            .map(|age| age < self.freshness)
            .unwrap_or(false)
    }

    fn read_cache(&self) -> Option<Vec<u8>> {
        std::fs::read(&self.cache_path).ok()
    }

    fn write_cache(&self, bytes: &[u8]) {
        if let Some(parent) = self.cache_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&self.cache_path, bytes) {
            warn!(source = %self.name, error = %e, "failed to write feed cache");
        }
    }

    /// Fetch current feed bytes: cache on a fresh hit, network
    /// otherwise, stale cache as the fallback of last resort.
    async fn feed_bytes(&self) -> Result<Vec<u8>, SourceError> {
        if self.cache_is_fresh() {
            if let Some(bytes) = self.read_cache() {
                debug!(source = %self.name, "feed cache hit");
                return Ok(bytes);
            }
        }

        match http_get(&self.url, FETCH_TIMEOUT).await {
            Ok(bytes) => {
                self.write_cache(&bytes);
                Ok(bytes)
            }
            Err(e) => match self.read_cache() {
                Some(bytes) => {
                    warn!(source = %self.name, error = %e, "feed fetch failed; using stale cache");
                    Ok(bytes)
                }
                None => Err(SourceError::Fetch(format!("{}: {e}", self.url))),
            },
        }
    }

    fn decode_feed(&self, bytes: &[u8]) -> Result<Feed, SourceError> {
        serde_json::from_slice(bytes)
            .map_err(|e| SourceError::Fetch(format!("feed decode failed: {e}")))
    }

    /// Convert one feed entry into the common recipe shape.
    fn convert(&self, slug: &str, entry: &FeedEntry) -> anyhow::Result<Recipe> {
        let template_bytes = BASE64.decode(entry.template.as_bytes())?;
        let template = String::from_utf8(template_bytes)?;

        let category = entry
            .tags
            .first()
            .cloned()
            .unwrap_or_else(|| "other".to_string());

        let tagline: String = entry.tagline.chars().take(TAGLINE_MAX_CHARS).collect();

        let updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Ok(Recipe {
            id: slug.to_string(),
            slug: slug.to_string(),
            name: slug.replace(['-', '_'], " "),
            category,
            description: entry.description.clone(),
            tagline,
            icon: entry.logo.clone(),
            options: Vec::new(),
            // The feed carries no resource metadata; estimate
            // conservatively.
            resources: ResourceRequirements::conservative(),
            health_check: HealthCheckSpec {
                path: "/".to_string(),
                port: 80,
                expected_status: 200,
                timeout_secs: 10,
            },
            database: DatabaseSpec::default(),
            template,
            volumes: BTreeMap::new(),
            metadata: RecipeMetadata {
                source: self.name.clone(),
                version: entry.min_version.clone(),
                updated_at,
                verified: false,
                quality_score: 0.5,
            },
        })
    }

    fn convert_feed(&self, feed: &Feed) -> BTreeMap<String, Recipe> {
        let mut recipes = BTreeMap::new();
        for (slug, entry) in feed {
            match self.convert(slug, entry) {
                Ok(recipe) => {
                    recipes.insert(slug.clone(), recipe);
                }
                Err(e) => {
                    warn!(source = %self.name, %slug, error = %e, "skipping malformed feed entry");
                }
            }
        }
        recipes
    }
}

#[async_trait]
impl RecipeSource for RemoteCatalogSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load_recipes(&self) -> Result<BTreeMap<String, Recipe>, SourceError> {
        let bytes = self.feed_bytes().await?;
        let feed = self.decode_feed(&bytes)?;
        Ok(self.convert_feed(&feed))
    }

    fn supports_updates(&self) -> bool {
        true
    }

    /// Re-fetch and report slugs absent from the previous cache. This
    /// is a coarse "new items only" notion of update, not a content
    /// diff.
    async fn check_for_updates(&self) -> Result<Vec<String>, SourceError> {
        let old: Feed = self
            .read_cache()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default();

        let bytes = http_get(&self.url, FETCH_TIMEOUT)
            .await
            .map_err(|e| SourceError::Fetch(format!("{}: {e}", self.url)))?;
        let new = self.decode_feed(&bytes)?;
        self.write_cache(&bytes);

        Ok(new_slugs(&old, &new))
    }
}

/// Slugs present in `new` but not `old`, in feed order.
fn new_slugs(old: &Feed, new: &Feed) -> Vec<String> {
    new.keys()
        .filter(|slug| !old.contains_key(*slug))
        .cloned()
        .collect()
}

/// One-shot HTTP GET, deadline-bounded. Only plain `http://` URLs are
/// supported; the catalog feed host is expected to sit on a trusted
/// network.
async fn http_get(url: &str, timeout: Duration) -> anyhow::Result<Vec<u8>> {
    let (address, path) = split_url(url)?;

    let result = tokio::time::timeout(timeout, async {
        let stream = tokio::net::TcpStream::connect(&address).await?;
        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = http::Request::builder()
            .method("GET")
            .uri(&path)
            .header("host", &address)
            .header("user-agent", "skiff-catalog/0.1")
            .body(http_body_util::Empty::<bytes::Bytes>::new())?;

        let resp = sender.send_request(req).await?;
        if !resp.status().is_success() {
            anyhow::bail!("feed responded with status {}", resp.status());
        }
        let body = resp.into_body().collect().await?.to_bytes();
        Ok::<_, anyhow::Error>(body.to_vec())
    })
    .await;

    match result {
        Ok(inner) => inner,
        Err(_) => anyhow::bail!("feed fetch timed out after {timeout:?}"),
    }
}

/// Split an `http://host[:port]/path` URL into connect address and
/// request path.
fn split_url(url: &str) -> anyhow::Result<(String, String)> {
    let rest = url
        .strip_prefix("http://")
        .ok_or_else(|| anyhow::anyhow!("unsupported feed URL scheme: {url}"))?;
    let (host, path) = match rest.split_once('/') {
        Some((host, path)) => (host, format!("/{path}")),
        None => (rest, "/".to_string()),
    };
    let address = if host.contains(':') {
        host.to_string()
    } else {
        format!("{host}:80")
    };
    Ok((address, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(template: &str, tags: &[&str], tagline: &str) -> FeedEntry {
        FeedEntry {
            template: BASE64.encode(template),
            description: "desc".to_string(),
            tagline: tagline.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            logo: "logo.png".to_string(),
            min_version: "1.0".to_string(),
        }
    }

    fn source_with_cache(dir: &std::path::Path, freshness: Duration) -> RemoteCatalogSource {
        RemoteCatalogSource::new(
            "feed",
            // Port 1 refuses connections immediately.
            "http://127.0.0.1:1/catalog.json",
            dir.join("feed.json"),
            freshness,
        )
    }

    #[test]
    fn split_url_variants() {
        assert_eq!(
            split_url("http://feeds.example.net/catalog.json").unwrap(),
            ("feeds.example.net:80".to_string(), "/catalog.json".to_string())
        );
        assert_eq!(
            split_url("http://10.0.0.5:8080/v1/feed").unwrap(),
            ("10.0.0.5:8080".to_string(), "/v1/feed".to_string())
        );
        assert!(split_url("https://secure.example.net/feed").is_err());
    }

    #[test]
    fn convert_decodes_template_and_synthesizes_category() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_with_cache(dir.path(), Duration::from_secs(60));

        let recipe = source
            .convert("ghost", &entry("services:\n  ghost: {}\n", &["blog", "cms"], "A blog"))
            .unwrap();

        assert_eq!(recipe.slug, "ghost");
        assert_eq!(recipe.category, "blog");
        assert_eq!(recipe.template, "services:\n  ghost: {}\n");
        assert_eq!(recipe.resources, ResourceRequirements::conservative());
        assert!(!recipe.metadata.verified);
    }

    #[test]
    fn convert_defaults_category_when_untagged() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_with_cache(dir.path(), Duration::from_secs(60));
        let recipe = source.convert("x", &entry("services:\n", &[], "")).unwrap();
        assert_eq!(recipe.category, "other");
    }

    #[test]
    fn convert_truncates_overlong_taglines() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_with_cache(dir.path(), Duration::from_secs(60));
        let long = "x".repeat(150);
        let recipe = source.convert("x", &entry("services:\n", &[], &long)).unwrap();
        assert_eq!(recipe.tagline.chars().count(), TAGLINE_MAX_CHARS);
    }

    #[test]
    fn convert_rejects_invalid_base64() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_with_cache(dir.path(), Duration::from_secs(60));
        let mut bad = entry("services:\n", &[], "");
        bad.template = "!!! not base64 !!!".to_string();
        assert!(source.convert("x", &bad).is_err());
    }

    #[tokio::test]
    async fn fresh_cache_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_with_cache(dir.path(), Duration::from_secs(3600));

        let mut feed = Feed::new();
        feed.insert("cached-app".to_string(), entry("services:\n  a: {}\n", &["tools"], ""));
        std::fs::write(dir.path().join("feed.json"), serde_json::to_vec(&feed).unwrap()).unwrap();

        // URL points at a dead port; a network attempt would fail.
        let recipes = source.load_recipes().await.unwrap();
        assert!(recipes.contains_key("cached-app"));
    }

    #[tokio::test]
    async fn fetch_failure_falls_back_to_stale_cache() {
        let dir = tempfile::tempdir().unwrap();
        // Zero freshness: the cache is always stale, forcing a fetch.
        let source = source_with_cache(dir.path(), Duration::ZERO);

        let mut feed = Feed::new();
        feed.insert("stale-app".to_string(), entry("services:\n  s: {}\n", &[], ""));
        std::fs::write(dir.path().join("feed.json"), serde_json::to_vec(&feed).unwrap()).unwrap();

        let recipes = source.load_recipes().await.unwrap();
        assert!(recipes.contains_key("stale-app"));
    }

    #[tokio::test]
    async fn fetch_failure_without_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_with_cache(dir.path(), Duration::ZERO);
        assert!(matches!(
            source.load_recipes().await,
            Err(SourceError::Fetch(_))
        ));
    }

    #[test]
    fn new_slugs_reports_additions_only() {
        let mut old = Feed::new();
        old.insert("a".to_string(), entry("t", &[], ""));
        let mut new = Feed::new();
        new.insert("a".to_string(), entry("changed", &[], ""));
        new.insert("b".to_string(), entry("t", &[], ""));

        // Content changes to existing slugs are not "updates".
        assert_eq!(new_slugs(&old, &new), vec!["b".to_string()]);
    }
}
