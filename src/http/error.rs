//! Server error type.

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid language pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid upstream address `{0}`")]
    InvalidUpstream(String),

    #[error("Config watcher error: {0}")]
    Watch(#[from] notify::Error),
}
