//! PDF Summarizer Library
//!
//! Loads PDF documents, splits them into overlapping chunks and summarizes
//! them with an LLM using the stuff, map_reduce or refine strategy.

pub mod api;
pub mod cache;
pub mod chunkers;
pub mod error;
pub mod llm;
pub mod loader;
pub mod pipeline;
pub mod router;
pub mod types;

use std::ops::RangeInclusive;

pub use cache::{CacheKey, DocumentCache};
pub use chunkers::{Chunker, RecursiveChunker, WindowChunker};
pub use error::{Error, ProviderError, Result};
pub use pipeline::Summarizer;
pub use router::ChunkingRouter;
pub use types::{ChunkConfig, Document, ModelChoice, Strategy, SummaryRequest, SummaryResult};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::*;
    pub use crate::chunkers::{visualizer, Chunker, RecursiveChunker, WindowChunker};
    pub use crate::error::*;
    pub use crate::llm::*;
    pub use crate::pipeline::*;
    pub use crate::router::ChunkingRouter;
    pub use crate::types::*;
}

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1900;

/// Default chunk overlap in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Accepted `chunk_size` values for API requests
pub const CHUNK_SIZE_RANGE: RangeInclusive<usize> = 100..=10_000;

/// Accepted `chunk_overlap` values for API requests
pub const CHUNK_OVERLAP_RANGE: RangeInclusive<usize> = 100..=10_000;

/// Maximum number of times a strategy is repeated per request
pub const MAX_REPEATS: u32 = 10;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3017;

/// Maximum upload size (20MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
