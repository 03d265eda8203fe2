//! Document type definitions.

use serde::Serialize;

/// An immutable chunk of text extracted from the source PDF.
///
/// Documents are produced by a splitter and consumed read-only by the
/// summarization pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    index: usize,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<usize>,
}

impl Document {
    /// Create a document at position `index` of a chunk sequence.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            start: None,
            page: None,
        }
    }

    /// Record the character offset of this chunk in the concatenated text.
    pub fn at_offset(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }

    /// Record the 1-based page this chunk was taken from.
    pub fn on_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Starting character offset, when known.
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    pub fn page(&self) -> Option<usize> {
        self.page
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
