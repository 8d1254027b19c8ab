//! skiff-env — synthesizes the environment a deployment ships with.
//!
//! The final variable mapping is assembled in four ordered layers
//! (user config, deployment identity, database credentials, generated
//! secrets); it is either fully built or the attempt fails. The vault
//! behind the `SecretVault` seam holds database passwords; losing one
//! is fatal to the build because the workload cannot run without its
//! credential.

pub mod builder;
pub mod error;
pub mod vault;

pub use builder::{EnvBuilder, render_dotenv};
pub use error::{EnvError, EnvResult};
pub use vault::SecretVault;
