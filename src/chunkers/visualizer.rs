//! HTML rendering of chunk and overlap boundaries.
//!
//! A debug aid: it shows how a given chunk size and overlap would cut a text,
//! using the same window arithmetic as the window chunker.

use std::ops::Range;

use serde::Serialize;

use super::window_chunker::windows;
use crate::types::ChunkConfig;

/// Background color for spans shared by two consecutive chunks.
pub const OVERLAP_COLOR: &str = "#808080";

/// Rotating palette for the non-overlapping part of each chunk.
pub const CHUNK_COLORS: [&str; 6] = [
    "#a8d08d", "#c6dbef", "#e6550d", "#fd8d3c", "#fdae6b", "#fdd0a2",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SegmentKind {
    /// The part of chunk `chunk_index` not shared with its predecessor
    Chunk { chunk_index: usize },
    /// Characters included in both the previous and the current chunk
    Overlap,
}

/// A contiguous span of the input with a single color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment<'a> {
    #[serde(flatten)]
    pub kind: SegmentKind,
    pub text: &'a str,
}

impl Segment<'_> {
    pub fn color(&self) -> &'static str {
        match self.kind {
            SegmentKind::Chunk { chunk_index } => CHUNK_COLORS[chunk_index % CHUNK_COLORS.len()],
            SegmentKind::Overlap => OVERLAP_COLOR,
        }
    }
}

/// Split `text` into colored segments, in order.
///
/// A span covered by a single window is colored as that chunk; a span covered
/// by two or more windows is an overlap. Concatenating the segment texts
/// reproduces the input exactly.
pub fn segments<'a>(text: &'a str, config: &ChunkConfig) -> Vec<Segment<'a>> {
    let spans = windows(text, config);

    let mut cuts: Vec<usize> = spans
        .iter()
        .flat_map(|w| [w.bytes.start, w.bytes.end])
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut ranges: Vec<(SegmentKind, Range<usize>)> = Vec::with_capacity(spans.len() * 2);
    // Windows are ordered by both start and end, so the ones covering a span
    // are contiguous from the first window that has not ended yet
    let mut first = 0;
    for cut in cuts.windows(2) {
        let (start, end) = (cut[0], cut[1]);
        while spans[first].bytes.end <= start {
            first += 1;
        }
        let covering = spans[first..]
            .iter()
            .take_while(|w| w.bytes.start <= start)
            .count();
        let kind = if covering > 1 {
            SegmentKind::Overlap
        } else {
            SegmentKind::Chunk { chunk_index: first }
        };

        match ranges.last_mut() {
            Some((last_kind, range)) if *last_kind == kind => range.end = end,
            _ => ranges.push((kind, start..end)),
        }
    }

    ranges
        .into_iter()
        .map(|(kind, range)| Segment {
            kind,
            text: &text[range],
        })
        .collect()
}

/// Render chunk boundaries as `<mark>` elements.
pub fn render_html(text: &str, config: &ChunkConfig) -> String {
    let mut html = String::with_capacity(text.len() * 2);
    for segment in segments(text, config) {
        html.push_str("<mark style=\"background-color: ");
        html.push_str(segment.color());
        html.push_str(";\">");
        html_escape::encode_text_to_string(segment.text, &mut html);
        html.push_str("</mark>");
    }
    html
}
