//! Magpie: an incremental timeline harvester
//!
//! Magpie walks a Nitter-style mirror one page at a time, extracts structured
//! posts out of the timeline markup, and merges anything new into a persisted
//! JSON collection without ever re-processing a post it has already seen.

pub mod config;
pub mod ledger;
pub mod model;
pub mod scraper;
pub mod storage;
pub mod timestamp;

use thiserror::Error;

/// Main error type for Magpie operations
#[derive(Debug, Error)]
pub enum MagpieError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Magpie operations
pub type Result<T> = std::result::Result<T, MagpieError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use ledger::{merge, Ledger};
pub use model::{Post, PostKind, PostReference};
pub use scraper::{harvest, Harvester, RunOptions};
