//! # kb-crawler - Keyword-guided crawling for knowledge bases
//!
//! This crate crawls a website breadth-first from one seed URL, following only
//! the links whose text or URL mentions one of a fixed set of keywords, and
//! turns every page it reaches into sentence-aligned text chunks.
//!
//! ## Features
//!
//! - Fetching with a shared HTTP client, timeouts and an optional rate limit
//! - Markdown cleanup that drops links, boilerplate and code-like lines
//! - Sentence-aligned chunking under a character budget
//! - Pluggable document stores (XML files, JSON lines, in-memory)
//! - Site scrapers with ordered preprocessing pipelines
//!
//! ## Example
//!
//! ```rust,no_run
//! use kb_crawler::crawler::{Crawler, CrawlerConfig, Fetcher, JsonLinesStore};
//!
//! #[tokio::main]
//! async fn main() -> kb_crawler::Result<()> {
//!     let fetcher = Fetcher::new(&CrawlerConfig::builder().rate_limit_ms(500).build())?;
//!     let store = JsonLinesStore::open("chunks.jsonl").await?;
//!
//!     let mut crawler = Crawler::new(fetcher, store, vec!["baggage".to_string()]);
//!     let summary = crawler.run("https://airpassengerrights.ca/en/").await?;
//!
//!     println!("Stored {} chunks", summary.chunks_stored);
//!     Ok(())
//! }
//! ```

mod error;

pub mod config;
pub mod crawler;
pub mod processor;
pub mod sites;

pub use error::{Error, Result};
