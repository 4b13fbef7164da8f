//! # Site Scrapers
//!
//! Scrapers for specific websites. Each one loads raw pages from its seeds
//! and runs them through an ordered pipeline of [`Preprocessor`]s; a
//! preprocessor returning `None` drops the document.
//!
//! [`AprScraper`] covers airpassengerrights.ca and [`RppaScraper`] covers
//! rppa-appr.ca. [`min_text_len`] and [`tag_issue`] run over the combined
//! output before [`save_documents`] files each document under its issue.
//!
//! Unlike [`crate::crawler::Crawler`], the loader here resolves relative
//! links and only follows links underneath the seed URL.

mod apr;
mod output;
mod preprocessors;
mod rppa;

pub use apr::AprScraper;
pub use output::{DocumentFormat, save_documents};
pub use preprocessors::{
    ISSUE_KEYWORDS, OTHER_ISSUE, filter_by_url, min_text_len, split_by_headers, tag_issue,
    trim_to_markers, trim_to_titles,
};
pub use rppa::RppaScraper;

use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use crate::crawler::{CrawlError, Fetcher, extract_urls};

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

/// A scraped document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Page content; HTML when loaded, Markdown once cleaned
    pub text: String,

    /// URL the document came from
    pub source: String,

    /// Title of the source page
    pub title: Option<String>,

    /// Heading trail of the section this document covers, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,

    /// Air travel issue the document is about, set by [`tag_issue`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

impl Document {
    /// A document with no title or headers
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            title: None,
            headers: Vec::new(),
            issue: None,
        }
    }
}

/// One step of a scraper's document pipeline
pub type Preprocessor = Box<dyn Fn(Document) -> Option<Document> + Send + Sync>;

/// A website-specific scraper
#[allow(async_fn_in_trait)]
pub trait SiteScraper {
    /// The ordered preprocessing pipeline
    fn preprocessors(&self) -> &[Preprocessor];

    /// Load and preprocess every document reachable from `seeds`
    async fn scrape(&self, seeds: &[String]) -> Result<Vec<Document>, CrawlError>;

    /// Run `doc` through the pipeline, stopping at the first step that drops it
    fn preprocess(&self, doc: Document) -> Option<Document> {
        self.preprocessors()
            .iter()
            .try_fold(doc, |doc, preprocessor| preprocessor(doc))
    }
}

/// Load `seed` and every page linked underneath it, breadth-first
///
/// Links are resolved against the page they appear on and stripped of
/// fragments. Pages deeper than `max_depth` links from the seed are not
/// loaded; failed fetches are skipped.
#[instrument(skip(fetcher))]
pub async fn load_recursive(
    fetcher: &Fetcher,
    seed: &str,
    max_depth: Option<usize>,
) -> Result<Vec<Document>, CrawlError> {
    let seed_url = Url::parse(seed)?;
    let prefix = seed_url.as_str().to_string();

    let mut queue = VecDeque::from([(seed_url.to_string(), 0usize)]);
    let mut seen = HashSet::from([seed_url.to_string()]);
    let mut documents = Vec::new();

    while let Some((url, depth)) = queue.pop_front() {
        let Some(page) = fetcher.fetch(&url).await else {
            continue;
        };

        if max_depth.is_none_or(|max| depth < max) {
            let base = Url::parse(&page.url)?;
            for href in extract_urls(&page.html) {
                let Ok(mut link) = base.join(&href) else {
                    debug!("Skipping unresolvable link {}", href);
                    continue;
                };
                link.set_fragment(None);
                let link = link.to_string();
                if link.starts_with(&prefix) && seen.insert(link.clone()) {
                    queue.push_back((link, depth + 1));
                }
            }
        }

        let title = Html::parse_document(&page.html)
            .select(&TITLE)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty());

        documents.push(Document {
            title,
            ..Document::new(page.html, page.url)
        });
    }

    info!("Loaded {} pages under {}", documents.len(), seed);
    Ok(documents)
}
