//! Markdown cleanup for crawled pages
//!
//! Turns the rough Markdown produced by the fetcher into one line of prose:
//! markup, links, bare URLs, boilerplate lines and code-looking lines are
//! dropped and whitespace is collapsed.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Node};
use tracing::instrument;

static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[.*?\]\(.*?\)").unwrap());
static EMPTY_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\]\(.*?\)").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[.*?\]\(.*?\)").unwrap());
static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*(),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+")
        .unwrap()
});
static LINK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[.*?\]\(.*?\)$").unwrap());
static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Contact us|Privacy Policy|Copyright|Terms of Service|Advertisement|Sitemap)\b")
        .unwrap()
});
static CODE_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"const | let | var | function | =>| \(\)| \{\}").unwrap()
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Lines with this many characters or fewer are dropped
const MIN_LINE_CHARS: usize = 5;

/// Clean rough Markdown into normalized prose
///
/// Returns an empty string when nothing survives; that is not an error.
#[instrument(skip(markdown), fields(len = markdown.len()))]
pub fn clean_markdown(markdown: &str) -> String {
    let text = visible_text(markdown);

    let text = IMAGE.replace_all(&text, "");
    let text = EMPTY_LINK.replace_all(&text, "");
    let text = LINK.replace_all(&text, "");
    let text = BARE_URL.replace_all(&text, "");

    let kept = text
        .split('\n')
        .filter(|line| !LINK_LINE.is_match(line))
        .filter(|line| !BOILERPLATE.is_match(line) && line.chars().count() > MIN_LINE_CHARS)
        .filter(|line| !CODE_LIKE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n");

    WHITESPACE.replace_all(&kept, " ").trim().to_string()
}

/// Parse `markdown` as HTML and collect its text, skipping `<script>` and `<style>` content
fn visible_text(markdown: &str) -> String {
    let fragment = Html::parse_fragment(markdown);

    let mut text = String::with_capacity(markdown.len());
    for node in fragment.tree.root().descendants() {
        let Node::Text(chunk) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| matches!(element.name(), "script" | "style"))
        });
        if !hidden {
            text.push_str(chunk);
        }
    }
    text
}
