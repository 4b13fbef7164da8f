//! Link extraction and keyword relevance filtering

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

static ANCHOR_WITH_HREF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Collect the `href` of every anchor in `html`
///
/// Links are returned in document order with duplicates kept. Relative
/// links are not resolved.
pub fn extract_urls(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_WITH_HREF)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Keep the URLs whose link context or address mentions one of `keywords`
///
/// The context of a URL is the text of the first anchor pointing at it plus
/// the text of that anchor's parent element. Later anchors with the same
/// target are never consulted. Matching is a case-insensitive substring
/// test; order of `urls` is preserved.
#[instrument(skip_all, fields(candidates = urls.len(), keywords = keywords.len()))]
pub fn filter_relevant_urls(urls: &[String], html: &str, keywords: &[String]) -> Vec<String> {
    let document = Html::parse_document(html);
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

    let relevant: Vec<String> = urls
        .iter()
        .filter(|url| {
            let context = surrounding_text(&document, url).to_lowercase();
            let url_lower = url.to_lowercase();
            keywords
                .iter()
                .any(|keyword| context.contains(keyword) || url_lower.contains(keyword))
        })
        .cloned()
        .collect();

    debug!("{} of {} links are relevant", relevant.len(), urls.len());
    relevant
}

/// Text of the first anchor whose `href` equals `url`, followed by its parent's text
fn surrounding_text(document: &Html, url: &str) -> String {
    let Some(anchor) = document
        .select(&ANCHOR_WITH_HREF)
        .find(|anchor| anchor.value().attr("href") == Some(url))
    else {
        return String::new();
    };

    let link_text: String = anchor.text().collect();
    let parent_text: String = anchor
        .parent()
        .and_then(ElementRef::wrap)
        .map(|parent| parent.text().collect())
        .unwrap_or_default();

    format!("{} {}", link_text, parent_text)
}
