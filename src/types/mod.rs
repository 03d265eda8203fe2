//! Core types for the summarizer.

mod config;
mod document;
mod summary;

pub use config::{ChunkConfig, ServiceConfig};
pub use document::Document;
pub use summary::{ModelChoice, SplitterKind, Strategy, SummaryRequest, SummaryResult};
