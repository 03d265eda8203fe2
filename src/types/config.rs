//! Configuration types for chunking and the service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT,
};

/// Global service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Port the HTTP server binds to
    pub port: u16,

    /// Chunk size used when a request omits it
    pub default_chunk_size: usize,

    /// Chunk overlap used when a request omits it
    pub default_chunk_overlap: usize,

    /// API key for the LLM provider
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    pub openai_base_url: String,

    /// Model used for `ModelChoice::Basic`
    pub basic_model: String,

    /// Model used for `ModelChoice::Advanced`
    pub advanced_model: String,

    /// Timeout applied to every LLM call
    pub llm_timeout_secs: u64,

    /// Retries for transient LLM failures
    pub llm_max_retries: u32,

    /// First backoff delay in milliseconds
    pub llm_backoff_base_ms: u64,

    /// Backoff ceiling in milliseconds
    pub llm_backoff_max_ms: u64,

    /// Maximum concurrent map calls per summary
    pub map_concurrency: usize,

    /// Maximum number of chunked documents kept in the cache
    pub cache_max_entries: u64,

    /// Idle time after which a cached document is evicted
    pub cache_idle_secs: u64,

    /// Maximum accepted request body
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            default_chunk_size: DEFAULT_CHUNK_SIZE,
            default_chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com".to_string(),
            basic_model: "gpt-3.5-turbo".to_string(),
            advanced_model: "gpt-4".to_string(),
            llm_timeout_secs: 60,
            llm_max_retries: 3,
            llm_backoff_base_ms: 500,
            llm_backoff_max_ms: 8_000,
            map_concurrency: 4,
            cache_max_entries: 64,
            cache_idle_secs: 30 * 60,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_or("PORT", defaults.port),
            default_chunk_size: env_or("CHUNK_SIZE", defaults.default_chunk_size),
            default_chunk_overlap: env_or("CHUNK_OVERLAP", defaults.default_chunk_overlap),
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or(defaults.openai_base_url),
            basic_model: std::env::var("BASIC_MODEL").unwrap_or(defaults.basic_model),
            advanced_model: std::env::var("ADVANCED_MODEL").unwrap_or(defaults.advanced_model),
            llm_timeout_secs: env_or("LLM_TIMEOUT_SECS", defaults.llm_timeout_secs),
            llm_max_retries: env_or("LLM_MAX_RETRIES", defaults.llm_max_retries),
            llm_backoff_base_ms: env_or("LLM_BACKOFF_BASE_MS", defaults.llm_backoff_base_ms),
            llm_backoff_max_ms: env_or("LLM_BACKOFF_MAX_MS", defaults.llm_backoff_max_ms),
            map_concurrency: env_or("MAP_CONCURRENCY", defaults.map_concurrency),
            cache_max_entries: env_or("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cache_idle_secs: env_or("CACHE_IDLE_SECS", defaults.cache_idle_secs),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn cache_idle(&self) -> Duration {
        Duration::from_secs(self.cache_idle_secs)
    }
}

/// Sliding-window parameters, measured in characters.
///
/// Invariant: `chunk_size > 0` and `chunk_overlap < chunk_size`, otherwise the
/// window would never advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChunkConfig {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl ChunkConfig {
    /// Create a validated config.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than zero"));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Create a config without overlap.
    pub fn with_size(chunk_size: usize) -> Result<Self> {
        Self::new(chunk_size, 0)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Distance between the starts of two consecutive windows. Always > 0.
    pub fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl<'de> Deserialize<'de> for ChunkConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            chunk_size: usize,
            chunk_overlap: usize,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.chunk_size, raw.chunk_overlap).map_err(serde::de::Error::custom)
    }
}
