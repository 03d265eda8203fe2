//! Summary request and result definitions.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;
use crate::error::{Error, Result};
use crate::llm::PromptTemplate;
use crate::MAX_REPEATS;

/// How chunk-level work is combined into one summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Summarize each chunk, then combine the partial summaries
    #[default]
    MapReduce,
    /// Put every chunk into a single call
    Stuff,
    /// Update a running summary one chunk at a time
    Refine,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::MapReduce, Strategy::Stuff, Strategy::Refine];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::MapReduce => "map_reduce",
            Strategy::Stuff => "stuff",
            Strategy::Refine => "refine",
        }
    }

    /// Number of LLM calls one execution issues for `chunks` documents.
    pub fn calls_for(&self, chunks: usize) -> usize {
        match self {
            Strategy::Stuff => 1,
            Strategy::MapReduce => chunks + 1,
            Strategy::Refine => chunks,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "map_reduce" | "map-reduce" | "mapreduce" => Ok(Strategy::MapReduce),
            "stuff" => Ok(Strategy::Stuff),
            "refine" => Ok(Strategy::Refine),
            other => Err(Error::config(format!(
                "unknown strategy '{other}', expected one of map_reduce, stuff, refine"
            ))),
        }
    }
}

/// Which of the two supported models to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    /// Fast, inexpensive chat model
    #[default]
    Basic,
    /// Larger, more capable model
    Advanced,
}

impl ModelChoice {
    pub const ALL: [ModelChoice; 2] = [ModelChoice::Basic, ModelChoice::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Basic => "basic",
            ModelChoice::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" | "chatgpt" => Ok(ModelChoice::Basic),
            "advanced" | "gpt4" | "gpt-4" => Ok(ModelChoice::Advanced),
            other => Err(Error::config(format!(
                "unknown model '{other}', expected basic or advanced"
            ))),
        }
    }
}

/// Which splitter turns extracted text into documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitterKind {
    /// Fixed-size sliding window over the concatenated text
    #[default]
    Window,
    /// Separator-aware splitting, page by page
    Recursive,
}

impl SplitterKind {
    pub const ALL: [SplitterKind; 2] = [SplitterKind::Window, SplitterKind::Recursive];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitterKind::Window => "window",
            SplitterKind::Recursive => "recursive",
        }
    }
}

impl fmt::Display for SplitterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "window" | "sliding" => Ok(SplitterKind::Window),
            "recursive" => Ok(SplitterKind::Recursive),
            other => Err(Error::config(format!(
                "unknown splitter '{other}', expected window or recursive"
            ))),
        }
    }
}

/// A fully validated summarization request.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub documents: Arc<Vec<Document>>,
    pub prompt: PromptTemplate,
    pub strategy: Strategy,
    pub repeats: u32,
    pub model: ModelChoice,
    pub temperature: f32,
}

impl SummaryRequest {
    /// Build a request with one repeat, the basic model and temperature 0.
    pub fn new(documents: Arc<Vec<Document>>, prompt: PromptTemplate, strategy: Strategy) -> Self {
        Self {
            documents,
            prompt,
            strategy,
            repeats: 1,
            model: ModelChoice::default(),
            temperature: 0.0,
        }
    }

    pub fn with_repeats(mut self, repeats: u32) -> Self {
        self.repeats = repeats;
        self
    }

    pub fn with_model(mut self, model: ModelChoice, temperature: f32) -> Self {
        self.model = model;
        self.temperature = temperature;
        self
    }

    /// Check every numeric bound and that there is something to summarize.
    pub fn validate(&self) -> Result<()> {
        if self.repeats == 0 || self.repeats > MAX_REPEATS {
            return Err(Error::config(format!(
                "repeats must be between 1 and {MAX_REPEATS}, got {}",
                self.repeats
            )));
        }
        if !self.temperature.is_finite() || !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::config(format!(
                "temperature must be between 0 and 1, got {}",
                self.temperature
            )));
        }
        if self.documents.iter().all(|d| d.text().trim().is_empty()) {
            return Err(Error::input("the document contains no extractable text"));
        }
        Ok(())
    }
}

/// The summaries produced for one request, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    pub strategy: Strategy,
    pub model: ModelChoice,
    pub chunk_count: usize,
    /// External calls issued across all repeats
    pub llm_calls: usize,
    pub summaries: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl SummaryResult {
    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}
