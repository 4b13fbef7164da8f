//! Writing scraped documents to disk
//!
//! Each document gets its own file in a directory named after its source
//! URL path (`/en/baggage/lost` becomes `en_baggage_lost`), inside a
//! subdirectory named after the document's issue when it has one. Files are
//! named by the document's index in the batch.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, instrument};
use url::Url;

use crate::crawler::StorageError;
use crate::sites::Document;

/// File format for saved documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Metadata lines followed by the document text
    Markdown,

    /// The document serialized as pretty JSON
    Json,
}

impl DocumentFormat {
    fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Markdown => "md",
            DocumentFormat::Json => "json",
        }
    }
}

/// Write every document under `dir`, returning the paths written
#[instrument(skip(documents), fields(count = documents.len()))]
pub async fn save_documents(
    documents: &[Document],
    dir: &Path,
    format: DocumentFormat,
) -> Result<Vec<PathBuf>, StorageError> {
    let mut written = Vec::with_capacity(documents.len());

    for (index, doc) in documents.iter().enumerate() {
        let base = match &doc.issue {
            Some(issue) => dir.join(issue),
            None => dir.to_path_buf(),
        };
        let doc_dir = base.join(source_dir_name(&doc.source)?);
        fs::create_dir_all(&doc_dir).await?;

        let path = doc_dir.join(format!("{}.{}", index, format.extension()));
        let contents = match format {
            DocumentFormat::Markdown => render_markdown(doc),
            DocumentFormat::Json => serde_json::to_string_pretty(doc)?,
        };
        fs::write(&path, contents).await?;
        written.push(path);
    }

    info!("Saved {} documents to {}", written.len(), dir.display());
    Ok(written)
}

fn source_dir_name(source: &str) -> Result<String, StorageError> {
    let url = Url::parse(source)?;
    Ok(url.path().trim_start_matches('/').replace('/', "_"))
}

fn render_markdown(doc: &Document) -> String {
    let mut metadata = vec![format!("source: {}", doc.source)];
    if let Some(title) = &doc.title {
        metadata.push(format!("title: {}", title));
    }
    if !doc.headers.is_empty() {
        metadata.push(format!("headers: {}", doc.headers.join(" > ")));
    }
    if let Some(issue) = &doc.issue {
        metadata.push(format!("issue: {}", issue));
    }
    format!("{}\n\n{}", metadata.join("\n\n"), doc.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Document {
        Document {
            text: "# Lost baggage\nFile within 21 days.".to_string(),
            source: "https://x/en/baggage/lost".to_string(),
            title: Some("Lost baggage".to_string()),
            headers: vec!["Baggage".to_string(), "Lost".to_string()],
            issue: None,
        }
    }

    #[test]
    fn test_render_markdown() {
        assert_eq!(
            render_markdown(&document()),
            "source: https://x/en/baggage/lost\n\ntitle: Lost baggage\n\nheaders: Baggage > Lost\n\n# Lost baggage\nFile within 21 days."
        );
    }

    #[tokio::test]
    async fn test_save_documents_markdown_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let docs = vec![document(), Document::new("Root page text.", "https://x/")];

        let written = save_documents(&docs, dir.path(), DocumentFormat::Markdown)
            .await
            .unwrap();
        assert_eq!(written[0], dir.path().join("en_baggage_lost/0.md"));
        assert_eq!(written[1], dir.path().join("1.md"));

        let written = save_documents(&docs, dir.path(), DocumentFormat::Json)
            .await
            .unwrap();
        let json = tokio::fs::read_to_string(&written[0]).await.unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, document());
    }

    #[tokio::test]
    async fn test_save_documents_groups_by_issue() {
        let dir = tempfile::tempdir().unwrap();
        let tagged = Document {
            issue: Some("denied boarding".to_string()),
            ..Document::new("Boarding was refused.", "https://x/en/denied-boarding")
        };

        let written = save_documents(&[tagged], dir.path(), DocumentFormat::Markdown)
            .await
            .unwrap();
        assert_eq!(
            written[0],
            dir.path().join("denied boarding/en_denied-boarding/0.md")
        );
        let markdown = tokio::fs::read_to_string(&written[0]).await.unwrap();
        assert_eq!(
            markdown,
            "source: https://x/en/denied-boarding\n\nissue: denied boarding\n\nBoarding was refused."
        );
    }

    #[tokio::test]
    async fn test_save_documents_rejects_relative_source() {
        let dir = tempfile::tempdir().unwrap();
        let docs = vec![Document::new("text", "/relative")];
        assert!(matches!(
            save_documents(&docs, dir.path(), DocumentFormat::Json).await,
            Err(StorageError::UrlParse(_))
        ));
    }
}
