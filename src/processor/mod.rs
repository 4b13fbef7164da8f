//! Content processor module
//!
//! Turns cleaned page text into the chunks handed to the document store.

mod chunking;
mod config;

pub use chunking::{chunk_text, split_sentences};
pub use config::{ChunkOptions, DEFAULT_MAX_CHUNK_SIZE};
