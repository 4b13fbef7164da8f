//! Page fetching and HTML to Markdown conversion

use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use html2md::parse_html;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{Instrument, debug, debug_span, error, instrument};

use crate::crawler::CrawlerConfig;
use crate::crawler::error::CrawlError;

/// A fetched page: the rough Markdown rendering and the HTML it came from
#[derive(Debug, Clone)]
pub struct RawPage {
    /// URL the page was fetched from
    pub url: String,

    /// Markdown rendering of the page body
    pub markdown: String,

    /// The original HTML response body
    pub html: String,
}

/// HTTP fetcher used by the crawl loop
///
/// Wraps a preconfigured `reqwest` client. Failures never escape
/// [`Fetcher::fetch`]; they are logged and reported as `None`.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl Fetcher {
    /// Create a fetcher with the session settings from `config`
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        let limiter = config
            .rate_limit()
            .and_then(Quota::with_period)
            .map(|quota| Arc::new(RateLimiter::direct(quota)));

        Ok(Self { client, limiter })
    }

    /// Fetch `url`, returning `None` on any network, status or content failure
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Option<RawPage> {
        match self.try_fetch(url).await {
            Ok(page) => Some(page),
            Err(e) => {
                error!("Error processing {}: {}", url, e);
                None
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<RawPage, CrawlError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().instrument(debug_span!("limiter")).await;
        }

        let response = self.client.get(url).send().await?.error_for_status()?;
        let html = response.text().await?;
        if html.trim().is_empty() {
            return Err(CrawlError::ContentExtraction(
                "response body is empty".to_string(),
            ));
        }

        let markdown = html_to_markdown(&body_html(&html)?);
        if markdown.trim().is_empty() {
            return Err(CrawlError::ContentExtraction(
                "page body rendered to empty markdown".to_string(),
            ));
        }

        debug!("Fetched {} ({} bytes of HTML)", url, html.len());
        Ok(RawPage {
            url: url.to_string(),
            markdown,
            html,
        })
    }
}

/// Serialize the `<body>` of `html` with its `<script>` and `<style>` subtrees removed
///
/// Falls back to the whole document when there is no body element.
pub fn body_html(html: &str) -> Result<String, CrawlError> {
    let document = Html::parse_document(html);

    let body_selector = Selector::parse("body")
        .map_err(|e| CrawlError::HtmlParse(format!("Failed to parse body selector: {}", e)))?;
    let excluded = Selector::parse("script, style")
        .map_err(|e| CrawlError::HtmlParse(format!("Failed to parse script selector: {}", e)))?;

    let root = document
        .select(&body_selector)
        .next()
        .unwrap_or_else(|| document.root_element());

    // Both strings come from the same serializer, so exact removal is safe
    let mut body = root.html();
    for element in root.select(&excluded) {
        body = body.replacen(&element.html(), "", 1);
    }

    Ok(body)
}

/// Convert HTML to Markdown
pub fn html_to_markdown(html: &str) -> String {
    parse_html(html)
}
