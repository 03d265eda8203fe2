//! Recursive text chunker with hierarchical splitting.

use std::collections::VecDeque;

use super::base::{char_len, Chunker};
use crate::types::{ChunkConfig, Document};

/// Recursive chunker that splits text hierarchically.
///
/// This chunker tries multiple split strategies in order of preference:
/// 1. Double newlines (paragraphs)
/// 2. Single newlines
/// 3. Spaces (words)
/// 4. Characters (last resort)
///
/// Pieces are merged greedily up to `chunk_size` characters. When a chunk is
/// emitted, its trailing pieces totalling at most `chunk_overlap` characters
/// are carried into the next one. Pieces that are still too large are split
/// again with the next separator.
pub struct RecursiveChunker {
    /// Separators in order of preference (most to least preferred)
    separators: Vec<&'static str>,
}

impl RecursiveChunker {
    /// Create a new recursive chunker with default separators.
    pub fn new() -> Self {
        Self {
            separators: vec!["\n\n", "\n", " ", ""],
        }
    }

    /// Create a recursive chunker with custom separators.
    ///
    /// The empty separator (character splitting) is always appended so every
    /// piece can eventually be made small enough.
    pub fn with_separators(mut separators: Vec<&'static str>) -> Self {
        if separators.last() != Some(&"") {
            separators.push("");
        }
        Self { separators }
    }

    /// Split text using the given separator.
    fn split_by_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
        if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        }
    }

    /// Recursively chunk text using the separator hierarchy.
    fn recursive_chunk(&self, text: &str, config: &ChunkConfig, separator_index: usize) -> Vec<String> {
        // If text fits in a single chunk, return it
        if char_len(text) <= config.chunk_size() {
            let trimmed = text.trim();
            return if trimmed.is_empty() {
                vec![]
            } else {
                vec![trimmed.to_string()]
            };
        }

        let found = self
            .separators
            .iter()
            .enumerate()
            .skip(separator_index)
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep));

        let (index, separator) = match found {
            Some((index, separator)) => (index, *separator),
            None => (self.separators.len(), ""),
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for split in Self::split_by_separator(text, separator) {
            if char_len(split) <= config.chunk_size() {
                pending.push(split);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(merge_splits(&pending, separator, config));
                pending.clear();
            }

            if index + 1 < self.separators.len() {
                chunks.extend(self.recursive_chunk(split, config, index + 1));
            } else {
                chunks.push(split.to_string());
            }
        }

        if !pending.is_empty() {
            chunks.extend(merge_splits(&pending, separator, config));
        }

        chunks
    }
}

/// Merge small splits into chunks of at most `chunk_size` characters,
/// carrying up to `chunk_overlap` characters of trailing splits forward.
fn merge_splits(splits: &[&str], separator: &str, config: &ChunkConfig) -> Vec<String> {
    let separator_len = char_len(separator);
    let mut chunks = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0;

    let joined_len = |current: &VecDeque<&str>| if current.is_empty() { 0 } else { separator_len };

    for split in splits {
        let len = char_len(split);

        if !current.is_empty() && total + len + separator_len > config.chunk_size() {
            push_joined(&mut chunks, &current, separator);

            // Keep the tail as overlap, but never so much that the next split cannot fit
            while total > config.chunk_overlap()
                || (total > 0 && total + len + joined_len(&current) > config.chunk_size())
            {
                let Some(first) = current.pop_front() else {
                    break;
                };
                total = total.saturating_sub(char_len(first) + joined_len(&current));
            }
        }

        total += len + joined_len(&current);
        current.push_back(split);
    }

    push_joined(&mut chunks, &current, separator);
    chunks
}

fn push_joined(chunks: &mut Vec<String>, pieces: &VecDeque<&str>, separator: &str) {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for RecursiveChunker {
    fn name(&self) -> &'static str {
        "recursive"
    }

    fn description(&self) -> &'static str {
        "Hierarchically splits each page using paragraph, line and word separators"
    }

    fn chunk(&self, text: &str, config: &ChunkConfig) -> Vec<Document> {
        self.recursive_chunk(text, config, 0)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Document::new(index, text))
            .collect()
    }

    fn chunk_pages(&self, pages: &[String], config: &ChunkConfig) -> Vec<Document> {
        let mut documents = Vec::new();
        for (page_index, page) in pages.iter().enumerate() {
            for text in self.recursive_chunk(page, config, 0) {
                documents.push(Document::new(documents.len(), text).on_page(page_index + 1));
            }
        }
        documents
    }
}
