//! Environment builder error types.

use thiserror::Error;

pub type EnvResult<T> = Result<T, EnvError>;

#[derive(Debug, Error)]
pub enum EnvError {
    /// The vault could not produce a provisioned database's password.
    /// Fatal: a deployment cannot run without its credential.
    #[error("failed to retrieve secret '{key}': {source}")]
    SecretRetrieval {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Post-build completeness check failed.
    #[error("environment is missing required keys: {}", .0.join(", "))]
    Incomplete(Vec<String>),
}
