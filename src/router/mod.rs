//! Chunking strategy router.

use std::sync::Arc;

use crate::chunkers::{Chunker, RecursiveChunker, WindowChunker};
use crate::types::{ChunkConfig, Document, ServiceConfig, SplitterKind};

/// Router that selects the chunker for a requested splitter.
pub struct ChunkingRouter {
    /// Sliding window chunker (default)
    window_chunker: Arc<WindowChunker>,
    /// Recursive chunker (per page, separator aware)
    recursive_chunker: Arc<RecursiveChunker>,
    /// Chunk configuration used when a request does not specify one
    default_config: ChunkConfig,
}

impl ChunkingRouter {
    /// Create a new chunking router with the given configuration.
    ///
    /// Falls back to the built-in defaults if the configured size and
    /// overlap are inconsistent.
    pub fn new(config: &ServiceConfig) -> Self {
        let default_config = ChunkConfig::new(config.default_chunk_size, config.default_chunk_overlap)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Invalid default chunk settings, using built-in defaults");
                ChunkConfig::default()
            });

        Self {
            window_chunker: Arc::new(WindowChunker::new()),
            recursive_chunker: Arc::new(RecursiveChunker::new()),
            default_config,
        }
    }

    /// Get the chunker for the given splitter.
    pub fn get_chunker(&self, kind: SplitterKind) -> Arc<dyn Chunker> {
        match kind {
            SplitterKind::Window => Arc::clone(&self.window_chunker) as Arc<dyn Chunker>,
            SplitterKind::Recursive => Arc::clone(&self.recursive_chunker) as Arc<dyn Chunker>,
        }
    }

    /// Split extracted pages with the requested chunker.
    pub fn split(&self, kind: SplitterKind, pages: &[String], config: &ChunkConfig) -> Vec<Document> {
        let chunker = self.get_chunker(kind);
        let documents = chunker.chunk_pages(pages, config);
        tracing::debug!(
            chunker = chunker.name(),
            pages = pages.len(),
            chunks = documents.len(),
            "Split document"
        );
        documents
    }

    /// Get the default chunk configuration.
    pub fn default_config(&self) -> &ChunkConfig {
        &self.default_config
    }

    /// List all available chunkers.
    pub fn list_chunkers(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            (self.window_chunker.name(), self.window_chunker.description()),
            (self.recursive_chunker.name(), self.recursive_chunker.description()),
        ]
    }
}

impl Default for ChunkingRouter {
    fn default() -> Self {
        Self::new(&ServiceConfig::default())
    }
}
