//! Sliding-window chunker for fixed-size character chunking.

use std::ops::Range;

use super::base::{char_bounds, Chunker};
use crate::types::{ChunkConfig, Document};

/// One window of the sliding-window walk over a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// First character of the window
    pub start: usize,
    /// One past the last character of the window
    pub end: usize,
    /// The same span in bytes, for slicing
    pub bytes: Range<usize>,
}

impl Window {
    /// Borrow the window's text out of the string it was computed from.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.bytes.clone()]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Walk `text` with a window of `chunk_size` characters advancing by
/// `chunk_size - chunk_overlap`.
///
/// The walk stops at the first window that reaches the end of the text, so
/// every window after the first starts exactly `chunk_overlap` characters
/// before the previous one ends and the last window may be shorter.
pub fn windows(text: &str, config: &ChunkConfig) -> Vec<Window> {
    let bounds = char_bounds(text);
    let total = bounds.len() - 1;

    let mut result = Vec::new();
    let mut start = 0;

    while start < total {
        let end = (start + config.chunk_size()).min(total);
        result.push(Window {
            start,
            end,
            bytes: bounds[start]..bounds[end],
        });

        if end == total {
            break;
        }
        start += config.step();
    }

    result
}

/// Fixed-size chunker that doesn't consider any textual boundaries.
///
/// Fast and predictable: chunk `n` starts at character `n * step`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowChunker;

impl WindowChunker {
    /// Create a new window chunker.
    pub fn new() -> Self {
        Self
    }
}

impl Chunker for WindowChunker {
    fn name(&self) -> &'static str {
        "window"
    }

    fn description(&self) -> &'static str {
        "Splits text into fixed-size character windows with overlap"
    }

    fn chunk(&self, text: &str, config: &ChunkConfig) -> Vec<Document> {
        windows(text, config)
            .into_iter()
            .enumerate()
            .map(|(index, window)| Document::new(index, window.slice(text)).at_offset(window.start))
            .collect()
    }
}
