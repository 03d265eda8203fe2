//! Capability traits for LLM backends.

use std::sync::Arc;

use async_trait::async_trait;

use super::PromptTemplate;
use crate::error::ProviderError;
use crate::types::ModelChoice;

/// A model that can turn a prompt and a text into a summary.
///
/// Implementations render `prompt` with `text` and issue exactly one
/// completion call.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    /// Model identifier, for logging.
    fn name(&self) -> &str;

    /// Issue one completion call.
    async fn summarize(&self, prompt: &PromptTemplate, text: &str) -> Result<String, ProviderError>;
}

/// Builds a [`SummaryModel`] for a model choice and temperature.
pub trait ModelProvider: Send + Sync {
    fn client(&self, model: ModelChoice, temperature: f32) -> Arc<dyn SummaryModel>;
}
