//! Document stores for chunked pages
//!
//! The crawl loop hands every processed page to a [`DocumentStore`]. A store
//! either accepts the chunks or returns an error, and an error ends the crawl.

use chrono::{DateTime, Utc};
use quick_xml::{de::from_str, se::to_string};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{io, path::Path, path::PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("XML serialization error: {0}")]
    SerializeError(#[from] quick_xml::errors::serialize::SeError),

    #[error("XML deserialization error: {0}")]
    DeserializeError(#[from] quick_xml::errors::serialize::DeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL for storage: {0}")]
    InvalidUrl(String),
}

type Result<T> = std::result::Result<T, StorageError>;

impl From<StorageError> for crate::error::Error {
    fn from(err: StorageError) -> Self {
        crate::error::Error::Storage(err.to_string())
    }
}

/// A sink for the chunks of one page
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Persist `chunks` (in document order) taken from `source_url`
    async fn save(&mut self, source_url: &str, chunks: &[String]) -> Result<()>;
}

/// One chunk as written by [`JsonLinesStore`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    /// URL the chunk was taken from
    pub source: String,

    /// Index of the chunk within its page
    pub position: usize,

    /// The chunk text
    pub text: String,

    /// When the chunk was written
    pub stored_at: DateTime<Utc>,
}

impl ChunkRecord {
    /// Records for all chunks of a page, stamped with the same time
    pub fn from_page(source_url: &str, chunks: &[String]) -> Vec<ChunkRecord> {
        let stored_at = Utc::now();
        chunks
            .iter()
            .enumerate()
            .map(|(position, text)| ChunkRecord {
                source: source_url.to_string(),
                position,
                text: text.clone(),
                stored_at,
            })
            .collect()
    }
}

/// Appends one JSON object per chunk to a single file
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    file: File,
}

impl JsonLinesStore {
    /// Open `path` for appending, creating it and its parent directories if needed
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_parent(&path).await?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self { path, file })
    }

    /// Path of the output file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for JsonLinesStore {
    async fn save(&mut self, source_url: &str, chunks: &[String]) -> Result<()> {
        let mut buffer = Vec::new();
        for record in ChunkRecord::from_page(source_url, chunks) {
            serde_json::to_writer(&mut buffer, &record)?;
            buffer.push(b'\n');
        }
        self.file.write_all(&buffer).await?;
        self.file.flush().await?;
        debug!("Appended {} chunks from {} to {}", chunks.len(), source_url, self.path.display());
        Ok(())
    }
}

/// XML representation of a chunked page for storage
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename = "page")]
pub struct PageEntry {
    /// URL of the page
    pub url: String,

    /// When the page was written
    pub stored_at: DateTime<Utc>,

    /// Chunks of the page in document order
    #[serde(rename = "chunk", default)]
    pub chunks: Vec<String>,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base path for storage
    pub base_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(".kb-crawler/pages"),
        }
    }
}

/// Writes one XML file per page under `<base>/<domain>/<path>-<hash>.xml`
///
/// The hash is taken over the whole URL, so pages that differ only in their
/// query or punctuation get separate files. A page fetched twice overwrites
/// its previous file.
#[derive(Debug, Clone, Default)]
pub struct XmlStore {
    config: StorageConfig,
}

impl XmlStore {
    /// Create a store with custom configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Gets the storage path for a given URL
    pub fn storage_path(&self, url: &str) -> Result<PathBuf> {
        let parsed = Url::parse(url)?;
        let domain = parsed
            .host_str()
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;

        let path = parsed.path();
        let stem = if path.is_empty() || path == "/" {
            "index".to_string()
        } else {
            let safe_path = path
                .chars()
                .map(|c| if c.is_alphanumeric() || c == '/' { c } else { '_' })
                .collect::<String>();
            safe_path.trim_matches('/').replace('/', "_")
        };
        let filename = format!("{}-{}.xml", stem, url_digest(parsed.as_str()));

        Ok(self.config.base_path.join(domain).join(filename))
    }

    /// Loads the stored entry for a page
    pub async fn load(&self, url: &str) -> Result<PageEntry> {
        let xml = fs::read_to_string(self.storage_path(url)?).await?;
        Ok(from_str(&xml)?)
    }
}

impl DocumentStore for XmlStore {
    async fn save(&mut self, source_url: &str, chunks: &[String]) -> Result<()> {
        let storage_path = self.storage_path(source_url)?;
        ensure_parent(&storage_path).await?;

        let entry = PageEntry {
            url: source_url.to_string(),
            stored_at: Utc::now(),
            chunks: chunks.to_vec(),
        };
        let xml = to_string(&entry)?;

        fs::write(
            &storage_path,
            format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml),
        )
        .await?;
        debug!("Stored {} chunks at {}", chunks.len(), storage_path.display());
        Ok(())
    }
}

/// Keeps pages in memory, in the order they were saved
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pages: Vec<(String, Vec<String>)>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved pages as `(url, chunks)` pairs
    pub fn pages(&self) -> &[(String, Vec<String>)] {
        &self.pages
    }
}

impl DocumentStore for MemoryStore {
    async fn save(&mut self, source_url: &str, chunks: &[String]) -> Result<()> {
        self.pages.push((source_url.to_string(), chunks.to_vec()));
        Ok(())
    }
}

/// First 12 hex digits of the SHA-256 of `url`
fn url_digest(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

/// Creates the parent directory of `path`
async fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks() -> Vec<String> {
        vec![
            "Report delayed baggage at the airport.".to_string(),
            "Keep your receipts & boarding pass.".to_string(),
        ]
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    #[test]
    fn test_storage_path() {
        let store = XmlStore::default();

        let root = store.storage_path("https://example.com/").unwrap();
        assert!(root.starts_with(".kb-crawler/pages/example.com"));
        assert!(file_name(&root).starts_with("index-"));

        let page = store.storage_path("https://example.com/dir/page").unwrap();
        assert!(file_name(&page).starts_with("dir_page-"));
        assert!(file_name(&page).ends_with(".xml"));
        assert_eq!(page, store.storage_path("https://example.com/dir/page").unwrap());

        let faq = store.storage_path("https://example.com/baggage/lost-faq").unwrap();
        assert!(file_name(&faq).starts_with("baggage_lost_faq-"));
    }

    #[test]
    fn test_storage_path_distinguishes_query_and_punctuation() {
        let store = XmlStore::default();
        let path = |url: &str| store.storage_path(url).unwrap();

        assert_ne!(
            path("https://example.com/faq?page=1"),
            path("https://example.com/faq?page=2")
        );
        assert_ne!(path("https://example.com/a-b"), path("https://example.com/a/b"));
    }

    #[tokio::test]
    async fn test_xml_store_keeps_pages_differing_in_query() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = XmlStore::with_config(StorageConfig {
            base_path: dir.path().to_path_buf(),
        });

        let first = "https://example.com/faq?page=1";
        let second = "https://example.com/faq?page=2";
        store.save(first, &["first page".to_string()]).await.unwrap();
        store.save(second, &["second page".to_string()]).await.unwrap();

        let entry = store.load(first).await.unwrap();
        assert_eq!(entry.url, first);
        assert_eq!(entry.chunks, vec!["first page".to_string()]);
        assert_eq!(store.load(second).await.unwrap().url, second);
    }

    #[test]
    fn test_storage_path_rejects_relative_url() {
        let store = XmlStore::default();
        match store.storage_path("/relative") {
            Err(StorageError::UrlParse(_)) => (),
            other => panic!("Expected UrlParse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_xml_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = XmlStore::with_config(StorageConfig {
            base_path: dir.path().to_path_buf(),
        });

        store.save("https://example.com/baggage", &chunks()).await.unwrap();
        let entry = store.load("https://example.com/baggage").await.unwrap();

        assert_eq!(entry.url, "https://example.com/baggage");
        assert_eq!(entry.chunks, chunks());
        assert!(store.storage_path("https://example.com/baggage").unwrap().exists());
    }

    #[tokio::test]
    async fn test_xml_store_empty_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = XmlStore::with_config(StorageConfig {
            base_path: dir.path().to_path_buf(),
        });

        store.save("https://example.com/", &[]).await.unwrap();
        let entry = store.load("https://example.com/").await.unwrap();
        assert!(entry.chunks.is_empty());
    }

    #[tokio::test]
    async fn test_json_lines_store_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/chunks.jsonl");

        let mut store = JsonLinesStore::open(&path).await.unwrap();
        store.save("https://example.com/a", &chunks()).await.unwrap();
        store.save("https://example.com/b", &[]).await.unwrap();
        store
            .save("https://example.com/c", &["Only one chunk here.".to_string()])
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let records: Vec<ChunkRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].source, "https://example.com/a");
        assert_eq!(records[1].position, 1);
        assert_eq!(records[1].text, "Keep your receipts & boarding pass.");
        assert_eq!(records[2].source, "https://example.com/c");
        assert_eq!(records[2].position, 0);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let mut store = MemoryStore::new();
        store.save("https://example.com/a", &chunks()).await.unwrap();
        assert_eq!(store.pages().len(), 1);
        assert_eq!(store.pages()[0].1, chunks());
    }
}
