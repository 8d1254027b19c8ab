//! skiff.toml configuration parser.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("vault.encryption_key is required when vault.production is set")]
    ProductionKeyMissing,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkiffConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub vault: VaultConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directories scanned for local recipe bundles, in registration
    /// order. Later sources override earlier ones on slug collisions.
    #[serde(default)]
    pub local_dirs: Vec<PathBuf>,
    pub remote: Option<RemoteFeedConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFeedConfig {
    pub url: String,
    pub cache_path: PathBuf,
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,
}

fn default_freshness_secs() -> u64 {
    86_400
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Key for the encrypted-file vault backend. Optional in
    /// development; mandatory in production.
    pub encryption_key: Option<String>,
    #[serde(default)]
    pub production: bool,
}

impl SkiffConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: SkiffConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Refuse to run production with no vault key. There is no
    /// fallback key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vault.production && self.vault.encryption_key.is_none() {
            return Err(ConfigError::ProductionKeyMissing);
        }
        Ok(())
    }
}
