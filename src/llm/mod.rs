//! LLM access: prompt templates, the model capability, the OpenAI client
//! and the retry wrapper.

mod openai;
mod prompt;
mod provider;
mod retry;

pub use openai::{OpenAiModel, OpenAiProvider};
pub use prompt::PromptTemplate;
pub use provider::{ModelProvider, SummaryModel};
pub use retry::{RetryPolicy, RetryingModel, RetryingProvider};
