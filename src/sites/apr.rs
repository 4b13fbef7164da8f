//! Scraper for the air passenger rights practical guides
//! (<https://airpassengerrights.ca/en/>)

use tracing::{info, instrument};

use crate::crawler::{CrawlError, Fetcher};
use crate::sites::preprocessors::{filter_by_url, trim_to_titles};
use crate::sites::{Document, Preprocessor, SiteScraper, load_recursive};

/// Guide pages scraped when no seeds are given
pub const BASE_URLS: &[&str] = &[
    "https://airpassengerrights.ca/en/practical-guides/baggage/damage",
    "https://airpassengerrights.ca/en/practical-guides/baggage/damage/step-by-step-guide",
    "https://airpassengerrights.ca/en/practical-guides/baggage/damage/faq",
    "https://airpassengerrights.ca/en/practical-guides/baggage/delay",
    "https://airpassengerrights.ca/en/practical-guides/baggage/delay/step-by-step-guide",
    "https://airpassengerrights.ca/en/practical-guides/baggage/delay/faq",
    "https://airpassengerrights.ca/en/practical-guides/baggage/lost",
    "https://airpassengerrights.ca/en/practical-guides/baggage/lost/step-by-step-guide",
    "https://airpassengerrights.ca/en/practical-guides/baggage/lost/faq",
    "https://airpassengerrights.ca/en/practical-guides/baggage/glossary",
];

/// Index pages that only link to guides
pub const EXCLUDE_URLS: &[&str] = &[
    "https://airpassengerrights.ca/en/practical-guides/",
    "https://airpassengerrights.ca/en/practical-guides/denied-boarding/canada-pre-appr/faq",
    "https://airpassengerrights.ca/en/practical-guides/denied-boarding/canada-pre-appr",
];

/// Headings where the guide content ends and sharing widgets begin
pub const INVALID_TITLES: &[&str] = &["Tweet", "Pin it", "Work in progress:"];

/// Heading prefixes of the navigation blocks between guide sections
pub const INVALID_PREFIXES: &[&str] = &[
    "Step by Step Guide\t\t\t\t\t",
    "Step by Step Guide Follow ",
    "FAQ Find answers",
    "Glossary List of terms",
];

/// Scraper for airpassengerrights.ca
pub struct AprScraper {
    fetcher: Fetcher,
    max_depth: Option<usize>,
    preprocessors: Vec<Preprocessor>,
}

impl AprScraper {
    /// Create a scraper that follows child links without a depth limit
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            max_depth: None,
            preprocessors: vec![
                Box::new(|doc: Document| filter_by_url(doc, EXCLUDE_URLS)) as Preprocessor,
                Box::new(|doc: Document| trim_to_titles(doc, INVALID_TITLES, INVALID_PREFIXES))
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
        BASE_URLS.iter().map(|url| url.to_string()).collect()
    }
}

impl SiteScraper for AprScraper {
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
