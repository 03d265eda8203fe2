//! PDF Summarizer - Main Entry Point
//!
//! Serves chunking, visualization and summarization over HTTP.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf_summarizer::api::{self, AppState};
use pdf_summarizer::cache::{CacheConfig, DocumentCache};
use pdf_summarizer::llm::{OpenAiProvider, RetryPolicy, RetryingProvider};
use pdf_summarizer::pipeline::Summarizer;
use pdf_summarizer::router::ChunkingRouter;
use pdf_summarizer::types::ServiceConfig;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "pdf_summarizer=info,tower_http=debug".into()),
    );
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    init_tracing();
    let config = ServiceConfig::from_env();

    info!("Starting PDF Summarizer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        chunk_size = config.default_chunk_size,
        chunk_overlap = config.default_chunk_overlap,
        basic_model = %config.basic_model,
        advanced_model = %config.advanced_model,
        "Loaded configuration"
    );

    // Initialize components
    let provider = OpenAiProvider::new(&config)?;
    if !provider.is_configured() {
        warn!("OPENAI_API_KEY is not set, summary requests will fail");
    }
    let provider = RetryingProvider::new(provider, RetryPolicy::from_config(&config));
    let summarizer =
        Summarizer::new(Arc::new(provider)).with_map_concurrency(config.map_concurrency);

    let state = Arc::new(AppState {
        router: ChunkingRouter::new(&config),
        cache: DocumentCache::with_config(CacheConfig::from_config(&config)),
        summarizer,
        config,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = api::app(state);

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
