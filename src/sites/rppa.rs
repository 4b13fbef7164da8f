//! Scraper for the Canadian Transportation Agency passenger rights pages
//! (<https://rppa-appr.ca/eng/>)

use tracing::{info, instrument};

use crate::crawler::{CrawlError, Fetcher};
use crate::sites::preprocessors::{filter_by_url, trim_to_markers};
use crate::sites::{Document, Preprocessor, SiteScraper, load_recursive};

/// Seed page
pub const BASE_URL: &str = "https://rppa-appr.ca/eng/";

/// Seed plus two levels of links
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Landing and archive pages
pub const EXCLUDE_URLS: &[&str] = &[
    "https://rppa-appr.ca/eng/",
    "https://rppa-appr.ca/eng/passenger-help",
    "https://rppa-appr.ca/eng/notices",
    "https://rppa-appr.ca/eng/archives",
    "https://rppa-appr.ca/eng/right/other-air-traveller-rights-and-information",
];

/// Blocks that are page widgets rather than content
pub const DROP_PREFIXES: &[&str] = &["This node", "Make a complaint", "MP3", "Listen to text"];

/// Blocks where the content ends and the related-material sections begin
pub const END_PREFIXES: &[&str] = &[
    "Notices",
    "Related Links",
    "Reference: ",
    "Resource Guides",
    "Resource guide",
];

/// Scraper for rppa-appr.ca
pub struct RppaScraper {
    fetcher: Fetcher,
    max_depth: Option<usize>,
    preprocessors: Vec<Preprocessor>,
}

impl RppaScraper {
    /// Create a scraper that follows links up to [`DEFAULT_MAX_DEPTH`] deep
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            max_depth: Some(DEFAULT_MAX_DEPTH),
            preprocessors: vec![
                Box::new(|doc: Document| filter_by_url(doc, EXCLUDE_URLS)) as Preprocessor,
                Box::new(|doc: Document| trim_to_markers(doc, DROP_PREFIXES, END_PREFIXES))
                    as Preprocessor,
            ],
        }
    }

    /// Limit how many links deep the loader follows from each seed
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The default seed list as owned strings
    pub fn default_seeds() -> Vec<String> {
        vec![BASE_URL.to_string()]
    }
}

impl SiteScraper for RppaScraper {
    fn preprocessors(&self) -> &[Preprocessor] {
        &self.preprocessors
    }

    #[instrument(skip(self))]
    async fn scrape(&self, seeds: &[String]) -> Result<Vec<Document>, CrawlError> {
        let mut documents = Vec::new();
        for seed in seeds {
            let loaded = load_recursive(&self.fetcher, seed, self.max_depth).await?;
            documents.extend(loaded.into_iter().filter_map(|doc| self.preprocess(doc)));
        }
        info!("Scraped {} documents from {} seeds", documents.len(), seeds.len());
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CrawlerConfig;
    use mockito::Server;

    fn scraper() -> RppaScraper {
        RppaScraper::new(Fetcher::new(&CrawlerConfig::default()).unwrap())
    }

    #[test]
    fn test_pipeline_drops_landing_pages() {
        let landing = Document::new("<h1>Air passenger rights</h1>", BASE_URL);
        assert!(scraper().preprocess(landing).is_none());
    }

    #[tokio::test]
    async fn test_scrape_against_local_site() {
        let mut server = Server::new_async().await;
        let _home = server
            .mock("GET", "/eng/")
            .with_status(200)
            .with_body(
                r#"<html><body><h1>Home</h1><p>Welcome to the passenger rights pages.</p>
                    <a href="flight-delays">Flight delays</a></body></html>"#,
            )
            .create_async()
            .await;
        let _delays = server
            .mock("GET", "/eng/flight-delays")
            .with_status(200)
            .with_body(
                r#"<html><head><title>Flight delays</title></head><body>
                    <p>Listen to text</p>
                    <h1>Flight delays</h1>
                    <p>Airlines must tell you about delays as soon as possible.</p>
                    <p>Make a complaint online</p>
                    <h2>Notices</h2><p>Old notice</p>
                    <a href="flight-delays/more">More</a></body></html>"#,
            )
            .create_async()
            .await;
        let deeper = server
            .mock("GET", "/eng/flight-delays/more")
            .expect(0)
            .create_async()
            .await;

        let docs = scraper()
            .with_max_depth(Some(1))
            .scrape(&[format!("{}/eng/", server.url())])
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(
            docs[1].text,
            "# Flight delays\nAirlines must tell you about delays as soon as possible."
        );
        deeper.assert_async().await;
    }
}
