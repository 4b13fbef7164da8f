//! # Website Crawler Module
//!
//! Breadth-first crawling that turns web pages into knowledge-base chunks.
//!
//! ## Key Components
//!
//! - `Fetcher`: HTTP GET plus HTML to Markdown conversion; failures are logged
//!   and reported as `None`
//! - `clean_markdown`: strips links, URLs, boilerplate and code-like lines
//! - `extract_urls` / `filter_relevant_urls`: link discovery and keyword gating
//! - `Crawler`: owns the frontier and visited set and runs the pipeline
//! - `DocumentStore`: where chunks go (`XmlStore`, `JsonLinesStore`, `MemoryStore`)
//!
//! ## Pipeline
//!
//! For every URL taken off the frontier: fetch → clean → chunk → store →
//! extract links → filter → enqueue. Links are enqueued at most once and
//! are not resolved against the page URL.

mod cleaner;
mod config;
mod controller;
mod error;
mod fetcher;
mod links;
pub mod storage;

pub use cleaner::clean_markdown;
pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use controller::{CrawlSummary, Crawler, PageOutcome};
pub use error::CrawlError;
pub use fetcher::{Fetcher, RawPage, body_html, html_to_markdown};
pub use links::{extract_urls, filter_relevant_urls};
pub use storage::{DocumentStore, JsonLinesStore, MemoryStore, StorageError, XmlStore};
