//! Summarization pipeline.

mod summarizer;

pub use summarizer::{run_strategy, Summarizer};
