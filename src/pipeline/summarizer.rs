//! Summarization strategies over chunked documents.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::llm::{ModelProvider, PromptTemplate, SummaryModel};
use crate::types::{Document, Strategy, SummaryRequest, SummaryResult};

/// Separator between chunks or partial summaries fed into one call.
const JOIN_SEPARATOR: &str = "\n\n";

/// Runs summary requests against models built by a [`ModelProvider`].
pub struct Summarizer {
    provider: Arc<dyn ModelProvider>,
    map_concurrency: usize,
}

impl Summarizer {
    /// Create a new summarizer.
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            map_concurrency: 4,
        }
    }

    /// Set how many map calls may be in flight at once.
    pub fn with_map_concurrency(mut self, concurrency: usize) -> Self {
        self.map_concurrency = concurrency.max(1);
        self
    }

    /// Execute the request's strategy `repeats` times.
    ///
    /// Every repeat is independent; nothing is shared or cached between them,
    /// so a non-deterministic model may return different summaries. Any
    /// failure fails the whole request; partial results are discarded.
    pub async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResult> {
        request.validate()?;

        let model = self.provider.client(request.model, request.temperature);
        let chunk_count = request.documents.len();

        info!(
            strategy = %request.strategy,
            model = model.name(),
            chunks = chunk_count,
            repeats = request.repeats,
            "Starting summarization"
        );

        let mut summaries = Vec::with_capacity(request.repeats as usize);
        for repeat in 0..request.repeats {
            let summary = run_strategy(
                model.as_ref(),
                request.strategy,
                &request.prompt,
                &request.documents,
                self.map_concurrency,
            )
            .await?;
            debug!(repeat, chars = summary.len(), "Summary produced");
            summaries.push(summary);
        }

        let llm_calls = request.strategy.calls_for(chunk_count) * summaries.len();
        info!(
            strategy = %request.strategy,
            summaries = summaries.len(),
            llm_calls,
            "Summarization complete"
        );

        Ok(SummaryResult {
            strategy: request.strategy,
            model: request.model,
            chunk_count,
            llm_calls,
            summaries,
            generated_at: Utc::now(),
        })
    }
}

/// One execution of a strategy.
pub async fn run_strategy(
    model: &dyn SummaryModel,
    strategy: Strategy,
    prompt: &PromptTemplate,
    documents: &[Document],
    map_concurrency: usize,
) -> Result<String> {
    if documents.is_empty() {
        return Err(Error::input("there are no chunks to summarize"));
    }

    match strategy {
        Strategy::Stuff => stuff(model, prompt, documents).await,
        Strategy::MapReduce => map_reduce(model, prompt, documents, map_concurrency).await,
        Strategy::Refine => refine(model, prompt, documents).await,
    }
}

/// All chunks in a single call.
async fn stuff(model: &dyn SummaryModel, prompt: &PromptTemplate, documents: &[Document]) -> Result<String> {
    let text = documents
        .iter()
        .map(Document::text)
        .collect::<Vec<_>>()
        .join(JOIN_SEPARATOR);
    Ok(model.summarize(prompt, &text).await?)
}

/// Generic summary per chunk, then the user prompt over the partial summaries.
///
/// Map calls run concurrently but the combine call only starts once all of
/// them have returned. The first failure aborts the remaining map calls.
async fn map_reduce(
    model: &dyn SummaryModel,
    prompt: &PromptTemplate,
    documents: &[Document],
    map_concurrency: usize,
) -> Result<String> {
    let map_prompt = PromptTemplate::map();

    // Collected first: a borrowing `map` closure on the stream makes the
    // handler future non-Send
    let calls: Vec<_> = documents
        .iter()
        .map(|doc| model.summarize(&map_prompt, doc.text()))
        .collect();

    let partials: Vec<String> = stream::iter(calls)
        .buffered(map_concurrency.max(1))
        .try_collect()
        .await?;

    debug!(partials = partials.len(), "Map phase complete");
    Ok(model.summarize(prompt, &partials.join(JOIN_SEPARATOR)).await?)
}

/// Running summary updated one chunk at a time.
async fn refine(model: &dyn SummaryModel, prompt: &PromptTemplate, documents: &[Document]) -> Result<String> {
    let (first, rest) = documents
        .split_first()
        .ok_or_else(|| Error::input("there are no chunks to summarize"))?;

    let mut summary = model.summarize(prompt, first.text()).await?;
    for doc in rest {
        let step = PromptTemplate::refine(prompt, &summary);
        summary = model.summarize(&step, doc.text()).await?;
        debug!(chunk = doc.index(), "Refined summary");
    }
    Ok(summary)
}
