pub mod config;
pub mod template;
pub mod types;

pub use config::SkiffConfig;
pub use types::*;
