//! Crawl settings file
//!
//! A YAML (or JSON, by `.json` extension) file naming the seed URL and the
//! relevance keywords, plus optional tuning:
//!
//! ```yaml
//! initial_url: https://airpassengerrights.ca/en/
//! query_keywords: [delay, baggage, refund]
//! max_chunk_size: 1000
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::error::Error as CrateError;
use crate::processor::DEFAULT_MAX_CHUNK_SIZE;

/// Error type for loading settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

impl From<ConfigError> for CrateError {
    fn from(err: ConfigError) -> Self {
        CrateError::Config(err.to_string())
    }
}

/// Settings for one crawl, read once at startup
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CrawlSettings {
    /// Seed URL
    pub initial_url: String,

    /// Relevance terms for link filtering
    pub query_keywords: Vec<String>,

    /// Character budget per chunk
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Minimum delay between requests in milliseconds
    #[serde(default)]
    pub rate_limit_ms: u64,

    /// Optional page budget
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// Where to write chunks
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_max_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_SIZE
}

impl CrawlSettings {
    /// Load settings from a YAML or JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let settings = if is_json {
            Self::from_json(&contents)?
        } else {
            Self::from_yaml(&contents)?
        };
        Ok(settings)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(contents)?;
        settings.validate()
    }

    /// Parse settings from JSON text
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(contents)?;
        settings.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.initial_url.trim().is_empty() {
            return Err(ConfigError::Invalid("initial_url is empty".to_string()));
        }
        if self.max_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "max_chunk_size must be positive".to_string(),
            ));
        }
        Ok(self)
    }
}
