//! Base trait for all chunkers.

use crate::types::{ChunkConfig, Document};

/// The core trait that all chunkers must implement.
///
/// A chunker takes extracted text and splits it into documents small enough
/// to be sent to the model one at a time. The config has already been
/// validated, so chunking itself cannot fail.
pub trait Chunker: Send + Sync {
    /// Get the name of this chunker.
    fn name(&self) -> &'static str;

    /// Chunk a single block of text.
    fn chunk(&self, text: &str, config: &ChunkConfig) -> Vec<Document>;

    /// Chunk the pages of a document.
    ///
    /// By default pages are concatenated with no boundary marker and chunked
    /// as one text.
    fn chunk_pages(&self, pages: &[String], config: &ChunkConfig) -> Vec<Document> {
        self.chunk(&pages.concat(), config)
    }

    /// Get the description of this chunker.
    fn description(&self) -> &'static str {
        "A text chunker"
    }
}

/// Count characters, the unit every chunk size is measured in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of every char boundary in `text`, including the end.
///
/// `bounds[n]` is the byte offset of the n-th character, so a character
/// range `a..b` maps to the byte range `bounds[a]..bounds[b]`.
pub fn char_bounds(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}
