//! # Processor Configuration Module
//!
//! Options for the sentence chunker.

/// Default maximum chunk size in characters
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1000;

/// Configuration for chunking text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Character budget for a chunk. Separators between sentences are not
    /// counted, and a sentence longer than the budget becomes its own chunk.
    pub max_chunk_size: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

impl ChunkOptions {
    /// Options with the given character budget
    pub fn with_max_chunk_size(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }
}
