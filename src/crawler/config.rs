//! # Crawler Configuration Module
//!
//! Options for the HTTP session and the crawl loop, built with a builder.
//!
//! The crawl loop has no depth limit. `max_pages` is the only brake on the
//! frontier and it is off unless a caller sets it.

use std::time::Duration;

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Maximum number of frontier entries to process, `None` for no limit
    pub max_pages: Option<u32>,

    /// Minimum delay in milliseconds between requests, 0 disables it
    pub rate_limit_ms: u64,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User agent to use for requests
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: None,
            rate_limit_ms: 0,
            timeout_secs: 30,
            user_agent: format!("kb-crawler/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Stop after this many pages have been taken off the frontier
    pub fn max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the minimum delay in milliseconds between requests
    pub fn rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.config.rate_limit_ms = rate_limit_ms;
        self
    }

    /// Set the per-request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the politeness delay as a Duration, if one is configured
    pub fn rate_limit(&self) -> Option<Duration> {
        (self.rate_limit_ms > 0).then(|| Duration::from_millis(self.rate_limit_ms))
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
