//! Timeouts and bounded exponential backoff for LLM calls.
//!
//! Transient failures (timeouts, rate limits, 5xx, transport errors) are
//! retried with jittered exponential backoff. Permanent failures are returned
//! on the first occurrence.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::provider::{ModelProvider, SummaryModel};
use super::PromptTemplate;
use crate::error::ProviderError;
use crate::types::{ModelChoice, ServiceConfig};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Maximum backoff delay
    pub max_delay: Duration,
    /// Timeout applied to every attempt
    pub timeout: Duration,
    /// Scale each delay by a random 50-100%
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            timeout: Duration::from_secs(60),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            max_retries: config.llm_max_retries,
            base_delay: Duration::from_millis(config.llm_backoff_base_ms),
            max_delay: Duration::from_millis(config.llm_backoff_max_ms),
            timeout: config.llm_timeout(),
            jitter: true,
        }
    }

    /// Backoff before retry number `retry` (0-based), capped at `max_delay`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry);
        let capped = self.base_delay.saturating_mul(factor).min(self.max_delay);

        if !self.jitter {
            return capped;
        }

        let jitter_factor = 0.5 + rand::random::<f64>() * 0.5;
        capped.mul_f64(jitter_factor)
    }
}

/// Wraps a model with per-call timeouts and retries.
pub struct RetryingModel {
    inner: Arc<dyn SummaryModel>,
    policy: RetryPolicy,
}

impl RetryingModel {
    pub fn new(inner: Arc<dyn SummaryModel>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn attempt(&self, prompt: &PromptTemplate, text: &str) -> Result<String, ProviderError> {
        match tokio::time::timeout(self.policy.timeout, self.inner.summarize(prompt, text)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.policy.timeout)),
        }
    }
}

#[async_trait]
impl SummaryModel for RetryingModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn summarize(&self, prompt: &PromptTemplate, text: &str) -> Result<String, ProviderError> {
        let mut retry = 0;
        loop {
            match self.attempt(prompt, text).await {
                Ok(summary) => {
                    if retry > 0 {
                        info!(model = self.name(), retries = retry, "LLM call succeeded after retry");
                    }
                    return Ok(summary);
                }
                Err(e) if e.is_transient() && retry < self.policy.max_retries => {
                    let delay = self.policy.backoff(retry);
                    warn!(
                        model = self.name(),
                        error = %e,
                        retry = retry + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Transient LLM failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// A provider whose clients all retry with the same policy.
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: ModelProvider> RetryingProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<P: ModelProvider> ModelProvider for RetryingProvider<P> {
    fn client(&self, model: ModelChoice, temperature: f32) -> Arc<dyn SummaryModel> {
        Arc::new(RetryingModel::new(
            self.inner.client(model, temperature),
            self.policy.clone(),
        ))
    }
}
