//! HTTP request handlers for the summarizer service.

use std::collections::HashMap;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::Html,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::cache::DocumentCache;
use crate::chunkers::visualizer;
use crate::error::{Error, Result};
use crate::llm::PromptTemplate;
use crate::pipeline::Summarizer;
use crate::router::ChunkingRouter;
use crate::types::{
    ChunkConfig, Document, ModelChoice, ServiceConfig, SplitterKind, Strategy, SummaryRequest,
};
use crate::{CHUNK_OVERLAP_RANGE, CHUNK_SIZE_RANGE, MAX_REPEATS};

/// Application state shared across handlers.
pub struct AppState {
    pub router: ChunkingRouter,
    pub cache: DocumentCache,
    pub summarizer: Summarizer,
    pub config: ServiceConfig,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Available splitter.
#[derive(Debug, Serialize)]
pub struct ChunkerInfo {
    name: String,
    description: String,
}

#[derive(Debug, Serialize)]
pub struct Bounds<T> {
    min: T,
    max: T,
    default: T,
}

/// Everything a client needs to build a valid request.
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    strategies: Vec<&'static str>,
    models: Vec<&'static str>,
    splitters: Vec<ChunkerInfo>,
    chunk_size: Bounds<usize>,
    chunk_overlap: Bounds<usize>,
    temperature: Bounds<f32>,
    repeats: Bounds<u32>,
}

/// List strategies, models, splitters and numeric bounds.
pub async fn list_options(State(state): State<Arc<AppState>>) -> Json<OptionsResponse> {
    let defaults = state.router.default_config();
    let splitters = state
        .router
        .list_chunkers()
        .into_iter()
        .map(|(name, desc)| ChunkerInfo {
            name: name.to_string(),
            description: desc.to_string(),
        })
        .collect();

    Json(OptionsResponse {
        strategies: Strategy::ALL.iter().map(Strategy::as_str).collect(),
        models: ModelChoice::ALL.iter().map(ModelChoice::as_str).collect(),
        splitters,
        chunk_size: Bounds {
            min: *CHUNK_SIZE_RANGE.start(),
            max: *CHUNK_SIZE_RANGE.end(),
            default: defaults.chunk_size(),
        },
        chunk_overlap: Bounds {
            min: *CHUNK_OVERLAP_RANGE.start(),
            max: *CHUNK_OVERLAP_RANGE.end(),
            default: defaults.chunk_overlap(),
        },
        temperature: Bounds {
            min: 0.0,
            max: 1.0,
            default: 0.0,
        },
        repeats: Bounds {
            min: 1,
            max: MAX_REPEATS,
            default: 1,
        },
    })
}

/// Fields of a multipart upload, read fully before any validation.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<Vec<u8>>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::input(format!("invalid multipart body: {}", e.body_text())))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::input(format!("failed to read upload: {}", e.body_text())))?;
                form.file = Some(bytes.to_vec());
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| Error::input(format!("invalid field '{name}': {}", e.body_text())))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// Non-blank value of a text field.
    fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Value of a text field exactly as sent, unless it is blank.
    fn raw(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    fn parse_or<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.text(name) {
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::config(format!("invalid {name} '{raw}': {e}"))),
            None => Ok(default),
        }
    }

    fn take_file(&mut self) -> Result<Vec<u8>> {
        match self.file.take() {
            Some(bytes) if !bytes.is_empty() => Ok(bytes),
            Some(_) => Err(Error::input("the uploaded file is empty")),
            None => Err(Error::input("no file uploaded, expected a 'file' field")),
        }
    }

    fn chunk_config(&self, defaults: &ChunkConfig) -> Result<ChunkConfig> {
        let chunk_size = self.parse_or("chunk_size", defaults.chunk_size())?;
        let chunk_overlap = self.parse_or("chunk_overlap", defaults.chunk_overlap())?;
        check_range("chunk_size", chunk_size, &CHUNK_SIZE_RANGE)?;
        check_range("chunk_overlap", chunk_overlap, &CHUNK_OVERLAP_RANGE)?;
        ChunkConfig::new(chunk_size, chunk_overlap)
    }

    fn splitter(&self) -> Result<SplitterKind> {
        self.text("splitter")
            .map_or(Ok(SplitterKind::default()), str::parse)
    }
}

fn check_range<T: PartialOrd + Display>(name: &str, value: T, range: &RangeInclusive<T>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{name} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )))
    }
}

/// Chunk preview response.
#[derive(Debug, Serialize)]
pub struct ChunkPreviewResponse {
    splitter: SplitterKind,
    chunk_size: usize,
    chunk_overlap: usize,
    chunk_count: usize,
    chunks: Vec<Document>,
}

/// Load and chunk an uploaded PDF without summarizing it.
pub async fn chunk_document(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ChunkPreviewResponse>> {
    let mut form = UploadForm::read(multipart).await?;
    let config = form.chunk_config(state.router.default_config())?;
    let splitter = form.splitter()?;
    let bytes = form.take_file()?;

    let documents = state
        .cache
        .load_pdf_documents(bytes, config, splitter, &state.router)
        .await?;

    Ok(Json(ChunkPreviewResponse {
        splitter,
        chunk_size: config.chunk_size(),
        chunk_overlap: config.chunk_overlap(),
        chunk_count: documents.len(),
        chunks: documents.as_ref().clone(),
    }))
}

/// Summaries for one uploaded document.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    request_id: Uuid,
    strategy: Strategy,
    model: ModelChoice,
    chunk_count: usize,
    llm_calls: usize,
    summaries: Vec<String>,
    generated_at: DateTime<Utc>,
}

/// Summarize an uploaded PDF.
///
/// Every option is validated before the PDF is parsed, so malformed requests
/// never reach the LLM.
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SummaryResponse>> {
    let request_id = Uuid::new_v4();
    let mut form = UploadForm::read(multipart).await?;

    let prompt = PromptTemplate::from_instruction(form.raw("prompt").unwrap_or_default())?;
    let strategy: Strategy = form.parse_or("strategy", Strategy::default())?;
    let model: ModelChoice = form.parse_or("model", ModelChoice::default())?;
    let temperature: f32 = form.parse_or("temperature", 0.0)?;
    let repeats: u32 = form.parse_or("repeats", 1)?;
    check_range("temperature", temperature, &(0.0..=1.0))?;
    check_range("repeats", repeats, &(1..=MAX_REPEATS))?;
    let config = form.chunk_config(state.router.default_config())?;
    let splitter = form.splitter()?;
    let bytes = form.take_file()?;

    info!(
        request_id = %request_id,
        strategy = %strategy,
        model = %model,
        repeats,
        bytes = bytes.len(),
        "Received summary request"
    );

    let documents = state
        .cache
        .load_pdf_documents(bytes, config, splitter, &state.router)
        .await?;

    let request = SummaryRequest::new(documents, prompt, strategy)
        .with_repeats(repeats)
        .with_model(model, temperature);
    let result = state.summarizer.summarize(&request).await?;

    info!(request_id = %request_id, llm_calls = result.llm_calls, "Summary request complete");

    Ok(Json(SummaryResponse {
        request_id,
        strategy: result.strategy,
        model: result.model,
        chunk_count: result.chunk_count,
        llm_calls: result.llm_calls,
        summaries: result.summaries,
        generated_at: result.generated_at,
    }))
}

/// Visualization request.
#[derive(Debug, Deserialize)]
pub struct VisualizeRequest {
    text: String,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
}

/// Render how a text would be chunked.
pub async fn visualize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VisualizeRequest>,
) -> Result<Html<String>> {
    let defaults = state.router.default_config();
    let config = ChunkConfig::new(
        request.chunk_size.unwrap_or(defaults.chunk_size()),
        request.chunk_overlap.unwrap_or(defaults.chunk_overlap()),
    )?;

    Ok(Html(visualizer::render_html(&request.text, &config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::app;
    use crate::cache::CacheKey;
    use crate::error::ProviderError;
    use crate::llm::{ModelProvider, SummaryModel};
    use crate::loader::test_pdf::build_pdf;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const BOUNDARY: &str = "summarizer-test-boundary";

    /// Counts calls and optionally fails every one of them.
    #[derive(Default)]
    struct FakeModel {
        calls: AtomicUsize,
        error: Option<ProviderError>,
    }

    #[async_trait]
    impl SummaryModel for FakeModel {
        fn name(&self) -> &str {
            "fake"
        }

        async fn summarize(&self, _prompt: &PromptTemplate, text: &str) -> std::result::Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.error {
                Some(e) => Err(e.clone()),
                None => Ok(format!("summary of {} chars", text.chars().count())),
            }
        }
    }

    struct FakeProvider(Arc<FakeModel>);

    impl ModelProvider for FakeProvider {
        fn client(&self, _model: ModelChoice, _temperature: f32) -> Arc<dyn SummaryModel> {
            self.0.clone()
        }
    }

    fn state_with(model: FakeModel) -> (Arc<AppState>, Arc<FakeModel>) {
        let model = Arc::new(model);
        let config = ServiceConfig::default();
        let state = Arc::new(AppState {
            router: ChunkingRouter::new(&config),
            cache: DocumentCache::new(),
            summarizer: Summarizer::new(Arc::new(FakeProvider(model.clone()))),
            config,
        });
        (state, model)
    }

    fn multipart(file: Option<&[u8]>, fields: &[(&str, &str)]) -> Request<Body> {
        multipart_to("/summaries", file, fields)
    }

    fn multipart_to(uri: &str, file: Option<&[u8]>, fields: &[(&str, &str)]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(bytes) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"doc.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Seed the cache so `bytes` resolve to `documents` without parsing a PDF.
    async fn seed_cache(state: &AppState, bytes: &[u8], texts: &[&str]) {
        let documents: Vec<Document> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Document::new(i, *t))
            .collect();
        state
            .cache
            .get_or_load(
                CacheKey::new(bytes, ChunkConfig::new(1000, 100).unwrap(), SplitterKind::Window),
                async move { Ok(documents) },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = state_with(FakeModel::default());
        let response = app(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_options_lists_choices() {
        let (state, _) = state_with(FakeModel::default());
        let response = app(state)
            .oneshot(Request::get("/options").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["strategies"], serde_json::json!(["map_reduce", "stuff", "refine"]));
        assert_eq!(body["models"], serde_json::json!(["basic", "advanced"]));
        assert_eq!(body["chunk_size"]["default"], 1900);
        assert_eq!(body["repeats"]["max"], 10);
    }

    #[tokio::test]
    async fn test_visualize_renders_marks() {
        let (state, _) = state_with(FakeModel::default());
        let request = Request::post("/chunks/visualize")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"text": "ABCDEFGHIJ", "chunk_size": 4, "chunk_overlap": 1}"#,
            ))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.starts_with(
            "<mark style=\"background-color: #a8d08d;\">ABC</mark><mark style=\"background-color: #808080;\">D</mark><mark style=\"background-color: #c6dbef;\">EF</mark>"
        ));
    }

    #[tokio::test]
    async fn test_visualize_rejects_overlap_not_below_size() {
        let (state, _) = state_with(FakeModel::default());
        let request = Request::post("/chunks/visualize")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text": "abc", "chunk_size": 4, "chunk_overlap": 4}"#))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["kind"], "configuration");
    }

    #[tokio::test]
    async fn test_invalid_options_fail_before_any_call() {
        let (state, model) = state_with(FakeModel::default());
        let cases: &[&[(&str, &str)]] = &[
            &[("prompt", "Summarize"), ("chunk_overlap", "50")],
            &[("prompt", "Summarize"), ("chunk_size", "500"), ("chunk_overlap", "500")],
            &[("prompt", "Summarize"), ("strategy", "reduce")],
            &[("prompt", "Summarize"), ("repeats", "11")],
            &[("prompt", "Summarize"), ("temperature", "1.5")],
            &[("prompt", "Compare {text} with {text}")],
            &[("prompt", "   ")],
        ];

        for fields in cases {
            let response = app(state.clone())
                .oneshot(multipart(Some(b"%PDF-1.4"), fields))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{fields:?}");
            assert_eq!(json_body(response).await["kind"], "configuration", "{fields:?}");
        }
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreadable_upload_is_input_error() {
        let (state, model) = state_with(FakeModel::default());

        let missing = app(state.clone())
            .oneshot(multipart(None, &[("prompt", "Summarize")]))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(missing).await["kind"], "input");

        let garbage = app(state)
            .oneshot(multipart(Some(b"definitely not a pdf"), &[("prompt", "Summarize")]))
            .await
            .unwrap();
        assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(garbage).await["kind"], "input");

        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summarize_cached_document() {
        let (state, model) = state_with(FakeModel::default());
        seed_cache(&state, b"cached upload", &["first chunk", "second chunk", "third chunk"]).await;

        let fields = [
            ("prompt", "Summarize for a lawyer"),
            ("strategy", "map_reduce"),
            ("chunk_size", "1000"),
            ("chunk_overlap", "100"),
            ("repeats", "2"),
        ];
        let response = app(state)
            .oneshot(multipart(Some(b"cached upload"), &fields))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["strategy"], "map_reduce");
        assert_eq!(body["chunk_count"], 3);
        assert_eq!(body["llm_calls"], 8);
        assert_eq!(body["summaries"].as_array().unwrap().len(), 2);
        assert_eq!(model.calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_provider_errors_map_to_gateway_statuses() {
        let cases = [
            (ProviderError::Timeout(std::time::Duration::from_secs(1)), StatusCode::SERVICE_UNAVAILABLE),
            (
                ProviderError::Api {
                    status: 400,
                    body: "context length exceeded".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (error, expected) in cases {
            let (state, _) = state_with(FakeModel {
                error: Some(error),
                ..Default::default()
            });
            seed_cache(&state, b"cached upload", &["only chunk"]).await;

            let fields = [
                ("prompt", "Summarize"),
                ("strategy", "stuff"),
                ("chunk_size", "1000"),
                ("chunk_overlap", "100"),
            ];
            let response = app(state)
                .oneshot(multipart(Some(b"cached upload"), &fields))
                .await
                .unwrap();

            assert_eq!(response.status(), expected);
            assert_eq!(json_body(response).await["kind"], "provider");
        }
    }

    #[test]
    fn test_prompt_is_read_verbatim() {
        let form = UploadForm {
            file: None,
            fields: HashMap::from([
                ("prompt".to_string(), "\nSummarize:\n{text}\n\n".to_string()),
                ("blank".to_string(), " \n ".to_string()),
                ("strategy".to_string(), " refine ".to_string()),
            ]),
        };

        assert_eq!(form.raw("prompt"), Some("\nSummarize:\n{text}\n\n"));
        assert_eq!(form.raw("blank"), None);
        assert_eq!(form.text("strategy"), Some("refine"));

        let template = PromptTemplate::from_instruction(form.raw("prompt").unwrap()).unwrap();
        assert_eq!(template.render("BODY"), "\nSummarize:\nBODY\n\n");
    }

    #[tokio::test]
    async fn test_map_reduce_over_uploaded_pdf() {
        let (state, model) = state_with(FakeModel::default());
        let pdf = build_pdf(&["First page", "Second page"]);
        let fields = [
            ("prompt", "Summarize for a lawyer"),
            ("strategy", "map_reduce"),
            ("chunk_size", "1000"),
            ("chunk_overlap", "100"),
        ];

        let response = app(state).oneshot(multipart(Some(&pdf), &fields)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["strategy"], "map_reduce");
        assert_eq!(body["chunk_count"], 1);
        assert_eq!(body["llm_calls"], 2);
        assert_eq!(body["summaries"].as_array().unwrap().len(), 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_chunk_preview() {
        let (state, model) = state_with(FakeModel::default());
        let pdf = build_pdf(&["First page", "Second page"]);

        let window = app(state.clone())
            .oneshot(multipart_to(
                "/documents/chunks",
                Some(&pdf),
                &[("chunk_size", "1000"), ("chunk_overlap", "100")],
            ))
            .await
            .unwrap();
        assert_eq!(window.status(), StatusCode::OK);
        let body = json_body(window).await;
        assert_eq!(body["splitter"], "window");
        assert_eq!(body["chunk_count"], 1);
        let text = body["chunks"][0]["text"].as_str().unwrap();
        let first = text.find("First page").unwrap();
        let second = text.find("Second page").unwrap();
        assert!(first < second);

        let recursive = app(state)
            .oneshot(multipart_to(
                "/documents/chunks",
                Some(&pdf),
                &[
                    ("chunk_size", "1000"),
                    ("chunk_overlap", "100"),
                    ("splitter", "recursive"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(recursive.status(), StatusCode::OK);
        let body = json_body(recursive).await;
        assert_eq!(body["chunk_count"], 2);
        assert_eq!(body["chunks"][0]["page"], 1);
        assert_eq!(body["chunks"][1]["page"], 2);
        assert!(body["chunks"][1]["text"].as_str().unwrap().contains("Second page"));

        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }
}
