//! Content-addressed cache of chunked documents.
//!
//! Uses moka for async-aware caching with size-bounded eviction. Entries are
//! keyed by the SHA-256 of the uploaded bytes together with the chunking
//! parameters. Concurrent loads of the same key share one computation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::loader::load_pdf;
use crate::router::ChunkingRouter;
use crate::types::{ChunkConfig, Document, ServiceConfig, SplitterKind};

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of documents kept
    pub max_capacity: u64,
    /// Time to idle for entries
    pub tti: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 64,
            tti: Duration::from_secs(30 * 60),
        }
    }
}

impl CacheConfig {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            max_capacity: config.cache_max_entries,
            tti: config.cache_idle(),
        }
    }
}

/// Identity of a chunked document: input digest plus chunking parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    digest: [u8; 32],
    config: ChunkConfig,
    splitter: SplitterKind,
}

impl CacheKey {
    pub fn new(bytes: &[u8], config: ChunkConfig, splitter: SplitterKind) -> Self {
        Self {
            digest: Sha256::digest(bytes).into(),
            config,
            splitter,
        }
    }

    /// Hex digest of the input bytes.
    pub fn digest_hex(&self) -> String {
        self.digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Chunked documents, shared between requests for the same upload.
pub struct DocumentCache {
    cache: Cache<CacheKey, Arc<Vec<Document>>>,
}

impl DocumentCache {
    /// Create a new document cache with default configuration
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a new document cache with custom configuration
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_idle(config.tti)
                .build(),
        }
    }

    /// Return the cached documents for `key`, running `load` on a miss.
    ///
    /// Only one `load` runs per key at a time; concurrent callers wait for it.
    /// Failed loads are not cached.
    pub async fn get_or_load<F>(&self, key: CacheKey, load: F) -> Result<Arc<Vec<Document>>>
    where
        F: Future<Output = Result<Vec<Document>>>,
    {
        self.cache
            .try_get_with(key, async move { load.await.map(Arc::new) })
            .await
            .map_err(|e: Arc<Error>| (*e).clone())
    }

    /// Extract, chunk and cache an uploaded PDF.
    pub async fn load_pdf_documents(
        &self,
        bytes: Vec<u8>,
        config: ChunkConfig,
        splitter: SplitterKind,
        router: &ChunkingRouter,
    ) -> Result<Arc<Vec<Document>>> {
        let key = CacheKey::new(&bytes, config, splitter);
        let digest = key.digest_hex();
        debug!(digest = %digest, "Looking up document cache");

        self.get_or_load(key, async move {
            let pdf = load_pdf(bytes).await?;
            if pdf.is_blank() {
                return Err(Error::input("the PDF contains no extractable text"));
            }
            let documents = router.split(splitter, &pdf.pages, &config);
            info!(
                digest = %digest,
                pages = pdf.page_count(),
                chunks = documents.len(),
                "PDF was loaded successfully"
            );
            Ok(documents)
        })
        .await
    }

    /// Get the current number of cached entries
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Run pending maintenance tasks (cleanup, eviction)
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new()
    }
}
