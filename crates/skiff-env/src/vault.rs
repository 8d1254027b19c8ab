//! The credential vault seam.

use async_trait::async_trait;

/// Stores and retrieves opaque secrets keyed by an identifier. Backed
/// outside this core by an OS-level secret store or an encrypted file.
#[async_trait]
pub trait SecretVault: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<String>;
    async fn store(&self, key: &str, secret: &str) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}
