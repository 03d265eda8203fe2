//! Error taxonomy for the summarizer.
//!
//! Configuration and input errors are raised before any external call is
//! issued. Provider errors come from the LLM backend and are split into
//! transient (worth retrying) and permanent failures.

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for every summarizer operation.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Invalid options: overlap >= chunk size, malformed prompt template,
    /// out-of-range numeric parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unusable user input: empty upload, unparseable PDF, no text to summarize.
    #[error("input error: {0}")]
    Input(String),

    /// The LLM backend failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Failure reported by an LLM provider call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM provider rate limited the request: {0}")]
    RateLimited(String),

    #[error("LLM transport failure: {0}")]
    Transport(String),

    #[error("LLM provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    #[error("LLM provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Transient errors are retried with backoff; permanent ones abort the request.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::RateLimited(_) | Self::Transport(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Parse(_) | Self::NotConfigured(_) => false,
        }
    }

    /// Classify an HTTP error status returned by the provider.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 429 {
            Self::RateLimited(body)
        } else {
            Self::Api { status, body }
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Transport(format!("request timed out: {err}"));
        }
        if err.is_decode() {
            return Self::Parse(err.to_string());
        }
        match err.status() {
            Some(status) => Self::from_status(status.as_u16(), err.to_string()),
            None => Self::Transport(err.to_string()),
        }
    }
}
