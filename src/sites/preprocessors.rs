//! Document preprocessors shared by the site scrapers

use std::sync::LazyLock;

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Selector};

use crate::processor::split_sentences;
use crate::sites::Document;

static BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6, p, li").unwrap());

/// A digit glued to a letter, or a word glued to a capitalized word
static MERGED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\s*\d+|\b\d+)([A-Za-z])|(\b[A-Za-z]+)([A-Z][a-z])").unwrap()
});

/// Issue labels and the source URL fragments that identify them, checked in order
pub const ISSUE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "flight delays and cancellations",
        &["flight-delay", "flight-cancellation"],
    ),
    ("lost, damaged or delayed baggage", &["baggage"]),
    ("denied boarding", &["boarding"]),
];

/// Issue label for documents matching none of [`ISSUE_KEYWORDS`]
pub const OTHER_ISSUE: &str = "other";

/// Drop documents whose source is one of `exclude`
pub fn filter_by_url(doc: Document, exclude: &[&str]) -> Option<Document> {
    (!exclude.contains(&doc.source.as_str())).then_some(doc)
}

/// Drop documents whose text has `min_chars` characters or fewer
pub fn min_text_len(doc: Document, min_chars: usize) -> Option<Document> {
    (doc.text.chars().count() > min_chars).then_some(doc)
}

/// Label the document with the first issue whose keywords appear in its source URL
pub fn tag_issue(mut doc: Document) -> Option<Document> {
    let issue = ISSUE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| doc.source.contains(keyword)))
        .map_or(OTHER_ISSUE, |(issue, _)| *issue);
    doc.issue = Some(issue.to_string());
    Some(doc)
}

/// Text blocks of an HTML page, in document order
#[derive(Debug, Clone, PartialEq)]
enum Block {
    Title { level: usize, text: String },
    Narrative(String),
    ListItem { depth: usize, text: String },
}

impl Block {
    fn title_text(&self) -> Option<&str> {
        match self {
            Block::Title { text, .. } => Some(text),
            _ => None,
        }
    }

    fn text(&self) -> &str {
        match self {
            Block::Title { text, .. } | Block::Narrative(text) | Block::ListItem { text, .. } => {
                text
            }
        }
    }

    fn starts_with_any(&self, prefixes: &[&str]) -> bool {
        prefixes.iter().any(|prefix| self.text().starts_with(prefix))
    }
}

/// Convert an HTML document into Markdown made of its headings, paragraphs
/// and list items, keeping only the span from the first heading up to the
/// first heading that is in `invalid_titles` or starts with one of
/// `invalid_prefixes`
///
/// Headings in the kept span have merged enumerations split apart
/// (`1Baggage` becomes `1 Baggage`, `LostBaggage` becomes `Lost Baggage`).
/// The first heading becomes the document title when it has none.
pub fn trim_to_titles(
    doc: Document,
    invalid_titles: &[&str],
    invalid_prefixes: &[&str],
) -> Option<Document> {
    let blocks = html_blocks(&doc.text);

    let start = blocks
        .iter()
        .position(|block| block.title_text().is_some())
        .unwrap_or(0);
    let end = blocks
        .iter()
        .position(|block| {
            block.title_text().is_some_and(|title| {
                invalid_titles.contains(&title)
                    || invalid_prefixes.iter().any(|prefix| title.starts_with(prefix))
            })
        })
        .unwrap_or(blocks.len());

    let kept: Vec<Block> = blocks
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .cloned()
        .map(|block| match block {
            Block::Title { level, text } => Block::Title {
                level,
                text: split_merged_words(&text),
            },
            other => other,
        })
        .collect();

    Some(render_blocks(doc, &kept))
}

/// Convert an HTML document into Markdown made of its headings, paragraphs
/// and list items, dropping blocks that start with one of `drop_prefixes`
/// and ending before the first remaining block that starts with one of
/// `end_prefixes`
///
/// The first heading becomes the document title when it has none.
pub fn trim_to_markers(
    doc: Document,
    drop_prefixes: &[&str],
    end_prefixes: &[&str],
) -> Option<Document> {
    let blocks: Vec<Block> = html_blocks(&doc.text)
        .into_iter()
        .filter(|block| !block.starts_with_any(drop_prefixes))
        .collect();
    let end = blocks
        .iter()
        .position(|block| block.starts_with_any(end_prefixes))
        .unwrap_or(blocks.len());

    Some(render_blocks(doc, &blocks[..end]))
}

fn render_blocks(doc: Document, blocks: &[Block]) -> Document {
    let title = doc
        .title
        .or_else(|| blocks.iter().find_map(Block::title_text).map(str::to_string));

    Document {
        text: blocks_to_markdown(blocks),
        title,
        ..doc
    }
}

/// Split a Markdown document into one document per `#`, `##` or `###` section
///
/// Section text excludes the heading line; the heading trail is recorded in
/// `headers`. Text before the first heading becomes a section with no
/// headers. Empty sections are dropped.
pub fn split_by_headers(doc: Document) -> Vec<Document> {
    let markdown = doc.text.as_str();

    let mut sections = Vec::new();
    let mut trail: Vec<String> = Vec::new();
    let mut content_start = 0;
    let mut heading: Option<(usize, String)> = None;

    let mut push_section = |start: usize, end: usize, trail: &[String]| {
        let text = markdown[start..end].trim();
        if !text.is_empty() {
            sections.push(Document {
                text: text.to_string(),
                headers: trail.to_vec(),
                ..doc.clone()
            });
        }
    };

    for (event, range) in Parser::new(markdown).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) if section_level(level).is_some() => {
                push_section(content_start, range.start, &trail);
                heading = section_level(level).map(|depth| (depth, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, heading_text)) = &mut heading {
                    heading_text.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(level)) if section_level(level).is_some() => {
                if let Some((depth, text)) = heading.take() {
                    trail.truncate(depth - 1);
                    trail.resize(depth - 1, String::new());
                    trail.push(text.trim().to_string());
                }
                content_start = range.end;
            }
            _ => {}
        }
    }
    push_section(content_start, markdown.len(), &trail);

    sections
}

fn section_level(level: HeadingLevel) -> Option<usize> {
    match level {
        HeadingLevel::H1 => Some(1),
        HeadingLevel::H2 => Some(2),
        HeadingLevel::H3 => Some(3),
        _ => None,
    }
}

fn split_merged_words(title: &str) -> String {
    MERGED_TITLE
        .replace_all(title, |caps: &Captures| match (caps.get(1), caps.get(2)) {
            (Some(number), Some(letter)) => format!("{} {}", number.as_str(), letter.as_str()),
            _ => format!("{} {}", &caps[3], &caps[4]),
        })
        .into_owned()
}

fn html_blocks(html: &str) -> Vec<Block> {
    let document = Html::parse_document(html);
    document
        .select(&BLOCKS)
        .filter_map(|element| {
            let name = element.value().name();
            // page chrome, and blocks already rendered as part of their list item
            let skipped = element.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
                match ancestor.value().name() {
                    "header" | "footer" => true,
                    "li" => name != "li",
                    _ => false,
                }
            });
            if skipped {
                return None;
            }

            let text = if name == "li" {
                normalize(&own_text(&element))
            } else {
                normalize(&element.text().collect::<String>())
            };
            if text.is_empty() {
                return None;
            }
            let block = match name {
                "p" => Block::Narrative(text),
                "li" => Block::ListItem {
                    depth: list_depth(&element),
                    text,
                },
                _ => Block::Title {
                    level: name[1..].parse().unwrap_or(1),
                    text,
                },
            };
            Some(block)
        })
        .collect()
}

fn list_depth(element: &ElementRef) -> usize {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|ancestor| matches!(ancestor.value().name(), "ul" | "ol"))
        .count()
        .max(1)
}

/// Text of a list item without the text of lists nested inside it
fn own_text(element: &ElementRef) -> String {
    let mut text = String::new();
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            match child_element.value().name() {
                "ul" | "ol" => {}
                "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    text.push(' ');
                    text.extend(child_element.text());
                    text.push(' ');
                }
                _ => text.extend(child_element.text()),
            }
        } else if let Some(chunk) = child.value().as_text() {
            text.push_str(chunk);
        }
    }
    text
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn blocks_to_markdown(blocks: &[Block]) -> String {
    let mut markdown = String::new();
    for block in blocks {
        match block {
            Block::Title { level, text } => {
                markdown.push_str("\n\n");
                markdown.push_str(&"#".repeat(*level));
                markdown.push(' ');
                markdown.push_str(text);
            }
            Block::Narrative(text) => {
                let question = split_sentences(text).len() <= 2 && text.ends_with('?');
                markdown.push_str(if question { "\n\n" } else { "\n" });
                markdown.push_str(text);
            }
            Block::ListItem { depth, text } => {
                markdown.push('\n');
                markdown.push_str(&" ".repeat(depth - 1));
                markdown.push_str("- ");
                markdown.push_str(text);
            }
        }
    }
    markdown.trim().to_string()
}
