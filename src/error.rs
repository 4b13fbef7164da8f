//! Error types for the kb-crawler crate

use thiserror::Error;

/// Result type for kb-crawler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for kb-crawler operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(String),

    /// Web crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Document store error
    #[error("Storage error: {0}")]
    Storage(String),
}
