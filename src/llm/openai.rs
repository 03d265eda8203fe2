//! HTTP client for OpenAI-compatible chat completion APIs.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::provider::{ModelProvider, SummaryModel};
use super::PromptTemplate;
use crate::error::ProviderError;
use crate::types::{ModelChoice, ServiceConfig};

/// Request payload for a chat completion.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response from the completion endpoint.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, ProviderError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Parse("missing choices[0].message.content".into()))
    }
}

/// Builds [`OpenAiModel`] clients sharing one connection pool.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: Option<Arc<str>>,
    base_url: Arc<str>,
    basic_model: String,
    advanced_model: String,
}

impl OpenAiProvider {
    /// Create a provider from the service configuration.
    pub fn new(config: &ServiceConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.openai_api_key.as_deref().map(Arc::from),
            base_url: Arc::from(config.openai_base_url.trim_end_matches('/')),
            basic_model: config.basic_model.clone(),
            advanced_model: config.advanced_model.clone(),
        })
    }

    /// Resolve a model choice to the configured model name.
    pub fn model_name(&self, model: ModelChoice) -> &str {
        match model {
            ModelChoice::Basic => &self.basic_model,
            ModelChoice::Advanced => &self.advanced_model,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl ModelProvider for OpenAiProvider {
    fn client(&self, model: ModelChoice, temperature: f32) -> Arc<dyn SummaryModel> {
        Arc::new(OpenAiModel {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            base_url: Arc::clone(&self.base_url),
            model: self.model_name(model).to_string(),
            temperature,
        })
    }
}

/// One model at one temperature.
pub struct OpenAiModel {
    client: Client,
    api_key: Option<Arc<str>>,
    base_url: Arc<str>,
    model: String,
    temperature: f32,
}

impl OpenAiModel {
    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl SummaryModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn summarize(&self, prompt: &PromptTemplate, text: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("OPENAI_API_KEY is not set".into()))?;

        let content = prompt.render(text);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &content,
            }],
            temperature: self.temperature,
        };

        let url = self.endpoint();
        debug!(model = %self.model, prompt_chars = content.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.model, status = status.as_u16(), "LLM provider returned an error");
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        parsed.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        let config = ServiceConfig {
            openai_base_url: "http://localhost:9999/".to_string(),
            ..ServiceConfig::default()
        };
        OpenAiProvider::new(&config).unwrap()
    }

    #[test]
    fn test_model_names() {
        let provider = provider();
        assert_eq!(provider.model_name(ModelChoice::Basic), "gpt-3.5-turbo");
        assert_eq!(provider.model_name(ModelChoice::Advanced), "gpt-4");
        assert_eq!(provider.client(ModelChoice::Advanced, 0.2).name(), "gpt-4");
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "gpt-4",
            messages: vec![ChatMessage {
                role: "user",
                content: "Summarize:\n\nhello",
            }],
            temperature: 0.5,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Summarize:\n\nhello");
        assert_eq!(json["temperature"], 0.5);
    }

    #[test]
    fn test_response_parsing() {
        let ok: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"A summary."}}]}"#,
        )
        .unwrap();
        assert_eq!(ok.into_text().unwrap(), "A summary.");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(empty.into_text(), Err(ProviderError::Parse(_))));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_permanent() {
        let provider = provider();
        assert!(!provider.is_configured());

        let model = provider.client(ModelChoice::Basic, 0.0);
        let err = model
            .summarize(&PromptTemplate::map(), "text")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert!(!err.is_transient());
    }
}
