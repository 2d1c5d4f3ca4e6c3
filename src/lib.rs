//! Swatchbook: a resilient UI component harvester
//!
//! This crate crawls component listing sites and code-host repositories, extracts
//! markup and style code through ordered fallback strategies, normalizes each capture
//! into a self-contained preview document, and persists de-duplicated records.

pub mod config;
pub mod crawler;
pub mod discovery;
pub mod extract;
pub mod normalize;
pub mod output;
pub mod page;
pub mod remote;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Swatchbook operations
#[derive(Debug, Error)]
pub enum SwatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Page at {url} did not become ready within {waited_secs}s")]
    NavigationTimeout { url: String, waited_secs: u64 },

    #[error("Page at {url} answered HTTP {status}")]
    NavigationStatus { url: String, status: u16 },

    #[error("Page error: {0}")]
    Page(#[from] page::PageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SwatchError {
    /// Returns true if retrying the same navigation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NavigationTimeout { .. })
            || matches!(self, Self::Http { source, .. } if source.is_timeout() || source.is_connect())
    }
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

    #[error("Missing required setting: {0}")]
    Missing(String),
}

/// Result type alias for Swatchbook operations
pub type Result<T> = std::result::Result<T, SwatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use normalize::{normalize, NormalizedDocument};
pub use state::{CrawlProgress, DedupIndex};
pub use url::natural_key;
