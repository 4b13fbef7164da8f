//! The crawl loop: frontier, visited set and the per-page pipeline

use std::collections::{HashSet, VecDeque};

use tracing::{info, instrument, warn};

use crate::crawler::cleaner::clean_markdown;
use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::links::{extract_urls, filter_relevant_urls};
use crate::crawler::storage::DocumentStore;
use crate::processor::{ChunkOptions, chunk_text};

/// Frontier size above which an unbounded crawl logs a warning
const FRONTIER_WARN_THRESHOLD: usize = 1000;

/// What happened to one URL taken off the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was fetched, chunked and stored
    Processed {
        url: String,
        chunks: usize,
        enqueued: Vec<String>,
    },

    /// The fetch failed and the URL was skipped
    Skipped { url: String },
}

/// Totals for a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages that were fetched and stored
    pub pages_processed: usize,

    /// Pages whose fetch failed
    pub pages_failed: usize,

    /// Chunks handed to the store
    pub chunks_stored: usize,

    /// URLs added to the frontier, the seed included
    pub urls_discovered: usize,

    /// Whether the loop stopped on the page budget rather than an empty frontier
    pub budget_exhausted: bool,
}

/// Breadth-first, keyword-guided crawler
///
/// Owns the frontier and the visited set. A URL is marked visited when it
/// is enqueued, so it can be enqueued at most once per crawler.
pub struct Crawler<S> {
    fetcher: Fetcher,
    store: S,
    keywords: Vec<String>,
    chunk_options: ChunkOptions,
    max_pages: Option<u32>,
    frontier: VecDeque<String>,
    visited: HashSet<String>,
    warned_frontier: bool,
}

impl<S: DocumentStore> Crawler<S> {
    /// Create a crawler with an empty frontier
    pub fn new(fetcher: Fetcher, store: S, keywords: Vec<String>) -> Self {
        Self {
            fetcher,
            store,
            keywords,
            chunk_options: ChunkOptions::default(),
            max_pages: None,
            frontier: VecDeque::new(),
            visited: HashSet::new(),
            warned_frontier: false,
        }
    }

    /// Create a crawler whose fetcher and page budget come from `config`
    pub fn from_config(
        config: &CrawlerConfig,
        store: S,
        keywords: Vec<String>,
    ) -> Result<Self, CrawlError> {
        let fetcher = Fetcher::new(config)?;
        Ok(Self::new(fetcher, store, keywords).with_max_pages(config.max_pages))
    }

    /// Use custom chunking options
    pub fn with_chunk_options(mut self, chunk_options: ChunkOptions) -> Self {
        self.chunk_options = chunk_options;
        self
    }

    /// Stop after `max_pages` frontier entries; `None` crawls until the frontier is empty
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// URLs waiting to be crawled, in crawl order
    pub fn frontier(&self) -> &VecDeque<String> {
        &self.frontier
    }

    /// Every URL ever enqueued
    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    /// The document store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the crawler and return its store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Add `url` to the frontier unless it was enqueued before
    ///
    /// Returns whether the URL was added.
    pub fn enqueue(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if !self.visited.insert(url.clone()) {
            return false;
        }
        self.frontier.push_back(url);

        if self.max_pages.is_none()
            && !self.warned_frontier
            && self.frontier.len() > FRONTIER_WARN_THRESHOLD
        {
            warn!(
                "Frontier holds {} URLs and no page budget is set",
                self.frontier.len()
            );
            self.warned_frontier = true;
        }
        true
    }

    /// Process the next frontier entry
    ///
    /// Returns `Ok(None)` when the frontier is empty. Fetch failures become
    /// [`PageOutcome::Skipped`]; store failures are returned as errors.
    pub async fn step(&mut self) -> Result<Option<PageOutcome>, CrawlError> {
        info!("Queue size: {}", self.frontier.len());
        let Some(url) = self.frontier.pop_front() else {
            return Ok(None);
        };
        info!("Processing URL: {}", url);

        let Some(page) = self.fetcher.fetch(&url).await else {
            return Ok(Some(PageOutcome::Skipped { url }));
        };

        let cleaned = clean_markdown(&page.markdown);
        let chunks = chunk_text(&cleaned, &self.chunk_options);
        self.store.save(&url, &chunks).await?;

        let links = extract_urls(&page.html);
        let relevant = filter_relevant_urls(&links, &page.html, &self.keywords);
        let enqueued = relevant
            .into_iter()
            .filter(|link| self.enqueue(link.clone()))
            .collect();

        Ok(Some(PageOutcome::Processed {
            url,
            chunks: chunks.len(),
            enqueued,
        }))
    }

    /// Crawl from `initial_url` until the frontier is empty or the page budget runs out
    #[instrument(skip(self))]
    pub async fn run(&mut self, initial_url: &str) -> Result<CrawlSummary, CrawlError> {
        let mut summary = CrawlSummary::default();
        if self.enqueue(initial_url) {
            summary.urls_discovered += 1;
        }

        let mut taken = 0u32;
        loop {
            if self.max_pages.is_some_and(|max| taken >= max) {
                if !self.frontier.is_empty() {
                    summary.budget_exhausted = true;
                    warn!(
                        "Page budget reached with {} URLs left in the frontier",
                        self.frontier.len()
                    );
                }
                break;
            }

            let Some(outcome) = self.step().await? else {
                break;
            };
            taken += 1;

            match outcome {
                PageOutcome::Processed {
                    chunks, enqueued, ..
                } => {
                    summary.pages_processed += 1;
                    summary.chunks_stored += chunks;
                    summary.urls_discovered += enqueued.len();
                }
                PageOutcome::Skipped { .. } => summary.pages_failed += 1,
            }
        }

        info!(
            "Crawl finished: {} pages processed, {} failed, {} chunks stored",
            summary.pages_processed, summary.pages_failed, summary.chunks_stored
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::storage::{MemoryStore, StorageError};
    use mockito::{Server, ServerGuard};

    fn keywords(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn fetcher() -> Fetcher {
        Fetcher::new(&CrawlerConfig::default()).unwrap()
    }

    async fn serve(server: &mut ServerGuard, path: &str, body: String) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(body)
            .create_async()
            .await
    }

    fn seed_page(base: &str) -> String {
        format!(
            r#"<html><body>
                <p>Passengers have rights when flights go wrong. Know them before you fly.</p>
                <ul>
                  <li><a href="{base}/u1">Flight delay compensation</a></li>
                  <li><a href="{base}/u2">About the team</a></li>
                </ul>
            </body></html>"#
        )
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let mut crawler = Crawler::new(fetcher(), MemoryStore::new(), Vec::new());
        assert!(crawler.enqueue("https://x/a"));
        assert!(!crawler.enqueue("https://x/a"));
        assert_eq!(crawler.frontier().len(), 1);
        assert_eq!(crawler.visited().len(), 1);
    }

    #[tokio::test]
    async fn test_one_iteration_enqueues_relevant_links_only() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _seed = serve(&mut server, "/", seed_page(&base)).await;

        let mut crawler = Crawler::new(fetcher(), MemoryStore::new(), keywords(&["delay"]));
        let u0 = format!("{}/", base);
        let u1 = format!("{}/u1", base);
        crawler.enqueue(u0.clone());

        let outcome = crawler.step().await.unwrap().unwrap();
        match outcome {
            PageOutcome::Processed { url, enqueued, .. } => {
                assert_eq!(url, u0);
                assert_eq!(enqueued, vec![u1.clone()]);
            }
            other => panic!("Expected a processed page, got {:?}", other),
        }

        assert_eq!(crawler.frontier().iter().collect::<Vec<_>>(), vec![&u1]);
        assert_eq!(crawler.visited(), &HashSet::from([u0.clone(), u1]));

        let stored = crawler.store().pages();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].0, u0);
        assert_eq!(stored[0].1.len(), 1);
        assert!(stored[0].1[0].starts_with("Passengers have rights when flights go wrong."));
        // link labels and targets are dropped by the cleaner
        assert!(!stored[0].1[0].contains("compensation"));
        assert!(!stored[0].1[0].contains("http"));
    }

    #[tokio::test]
    async fn test_run_visits_each_page_once() {
        let mut server = Server::new_async().await;
        let base = server.url();

        let seed = serve(&mut server, "/", seed_page(&base)).await;
        let u1 = server
            .mock("GET", "/u1")
            .with_status(200)
            .with_body(format!(
                r#"<html><body><p>Delays over three hours are compensated.</p>
                   <a href="{base}/">Back to delay overview</a>
                   <a href="{base}/u1">This delay page</a>
                   <a href="{base}/u3">More on delay refunds</a></body></html>"#
            ))
            .expect(1)
            .create_async()
            .await;
        let u3 = server
            .mock("GET", "/u3")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let u2 = server.mock("GET", "/u2").expect(0).create_async().await;

        let mut crawler = Crawler::new(fetcher(), MemoryStore::new(), keywords(&["delay"]));
        let summary = crawler.run(&format!("{}/", base)).await.unwrap();

        assert_eq!(summary.pages_processed, 2);
        assert_eq!(summary.pages_failed, 1);
        assert_eq!(summary.urls_discovered, 3);
        assert!(!summary.budget_exhausted);
        assert!(crawler.frontier().is_empty());
        assert_eq!(crawler.visited().len(), 3);

        seed.assert_async().await;
        u1.assert_async().await;
        u3.assert_async().await;
        u2.assert_async().await;
    }

    #[tokio::test]
    async fn test_run_respects_page_budget() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _seed = serve(&mut server, "/", seed_page(&base)).await;
        let u1 = server.mock("GET", "/u1").expect(0).create_async().await;

        let mut crawler = Crawler::new(fetcher(), MemoryStore::new(), keywords(&["delay"]))
            .with_max_pages(Some(1));
        let summary = crawler.run(&format!("{}/", base)).await.unwrap();

        assert_eq!(summary.pages_processed, 1);
        assert!(summary.budget_exhausted);
        assert_eq!(crawler.frontier().len(), 1);
        u1.assert_async().await;
    }

    #[tokio::test]
    async fn test_page_budget_from_config() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _seed = serve(&mut server, "/", seed_page(&base)).await;
        let u1 = server.mock("GET", "/u1").expect(0).create_async().await;

        let config = CrawlerConfig::builder().max_pages(Some(1)).build();
        let mut crawler =
            Crawler::from_config(&config, MemoryStore::new(), keywords(&["delay"])).unwrap();
        let summary = crawler.run(&format!("{}/", base)).await.unwrap();

        assert_eq!(summary.pages_processed, 1);
        assert!(summary.budget_exhausted);
        u1.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_seed_ends_crawl() {
        let mut server = Server::new_async().await;
        let _seed = server
            .mock("GET", "/")
            .with_status(503)
            .create_async()
            .await;

        let mut crawler = Crawler::new(fetcher(), MemoryStore::new(), keywords(&["delay"]));
        let summary = crawler.run(&format!("{}/", server.url())).await.unwrap();

        assert_eq!(summary.pages_processed, 0);
        assert_eq!(summary.pages_failed, 1);
        assert!(crawler.store().pages().is_empty());
    }

    struct FailingStore;

    impl DocumentStore for FailingStore {
        async fn save(&mut self, _source_url: &str, _chunks: &[String]) -> Result<(), StorageError> {
            Err(StorageError::InvalidUrl("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_aborts_crawl() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _seed = serve(&mut server, "/", seed_page(&base)).await;

        let mut crawler = Crawler::new(fetcher(), FailingStore, keywords(&["delay"]));
        let result = crawler.run(&format!("{}/", base)).await;

        assert!(matches!(result, Err(CrawlError::Store(_))));
        assert!(crawler.frontier().is_empty());
    }
}
