//! # Sentence Chunking Module
//!
//! Splits cleaned prose into chunks made of whole sentences.
//!
//! Sentences come from the Unicode sentence boundary rules (UAX #29) and are
//! packed greedily, in document order, until the next sentence would push
//! the summed sentence lengths past the budget. Sentences are never split,
//! so one long sentence becomes an oversized chunk of its own.
//!
//! Lengths are counted in characters and the single spaces inserted between
//! sentences are not counted, so a chunk can be a few characters longer than
//! `max_chunk_size`.

use crate::processor::ChunkOptions;
use tracing::{debug, instrument};
use unicode_segmentation::UnicodeSegmentation;

/// Split `text` into trimmed, non-empty sentences
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split_sentence_bounds()
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Chunk text into groups of sentences bounded by `options.max_chunk_size`
///
/// Empty input produces no chunks.
#[instrument(skip(text), fields(len = text.len()))]
pub fn chunk_text(text: &str, options: &ChunkOptions) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();

        if current_len + sentence_len <= options.max_chunk_size {
            current.push(sentence);
            current_len += sentence_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }
        current = vec![sentence];
        current_len = sentence_len;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    debug!("Created {} chunks", chunks.len());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let text = "Your flight was delayed. Were you told why? Ask for a meal voucher!";
        assert_eq!(
            split_sentences(text),
            vec![
                "Your flight was delayed.",
                "Were you told why?",
                "Ask for a meal voucher!"
            ]
        );
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk_text("", &ChunkOptions::default()).is_empty());
        assert!(chunk_text("   ", &ChunkOptions::default()).is_empty());
    }

    #[test]
    fn test_greedy_packing() {
        let text = "One two three. Four five six. Seven eight nine.";
        let chunks = chunk_text(text, &ChunkOptions::with_max_chunk_size(30));
        assert_eq!(
            chunks,
            vec!["One two three. Four five six.", "Seven eight nine."]
        );
    }

    #[test]
    fn test_separators_are_not_counted() {
        // 14 + 14 characters fit a budget of 28, the joined chunk is 29 long
        let text = "One two three. Four five six.";
        let chunks = chunk_text(text, &ChunkOptions::with_max_chunk_size(28));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chars().count(), 29);
    }

    #[test]
    fn test_oversized_sentence_is_its_own_chunk() {
        let sentence = format!("{}end.", "baggage ".repeat(40));
        let chunks = chunk_text(&sentence, &ChunkOptions::with_max_chunk_size(50));
        assert_eq!(chunks, vec![sentence.clone()]);
        assert_eq!(chunks[0].chars().count(), sentence.chars().count());
    }

    #[test]
    fn test_oversized_sentence_between_small_ones() {
        let long = format!("Delays {}end.", "delay ".repeat(20));
        let text = format!("Short one. {} Short two.", long);
        let chunks = chunk_text(&text, &ChunkOptions::with_max_chunk_size(40));
        assert_eq!(chunks, vec!["Short one.".to_string(), long, "Short two.".to_string()]);
    }

    #[test]
    fn test_chunks_preserve_sentence_sequence() {
        let text = "Airlines must inform you of your rights. Compensation depends on the delay length! \
                    Do you need a hotel? Keep every receipt. Claims can take up to thirty days. \
                    Escalate to the regulator if the airline refuses.";

        for budget in [1, 20, 60, 120, 1000] {
            let chunks = chunk_text(text, &ChunkOptions::with_max_chunk_size(budget));
            let rejoined = chunks.join(" ");
            assert_eq!(split_sentences(&rejoined), split_sentences(text), "budget {}", budget);
        }
    }

    #[test]
    fn test_utf8_lengths_are_counted_in_characters() {
        let text = "Ça coûte cher. Très cher.";
        let chunks = chunk_text(text, &ChunkOptions::with_max_chunk_size(24));
        assert_eq!(chunks, vec!["Ça coûte cher. Très cher."]);
    }
}
