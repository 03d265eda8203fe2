//! HTTP surface of the summarizer.

pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::error::Error;

pub use handlers::AppState;

/// Build the service router with its middleware.
pub fn app(state: Arc<AppState>) -> Router {
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/options", get(handlers::list_options))
        .route("/documents/chunks", post(handlers::chunk_document))
        .route("/summaries", post(handlers::summarize))
        .route("/chunks/visualize", post(handlers::visualize))
        .with_state(state)
        // Uploads are bounded by the configured limit instead of axum's 2MB default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    error: String,
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::Configuration(_) | Error::Input(_) => StatusCode::BAD_REQUEST,
            Error::Provider(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            Error::Provider(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration",
            Error::Input(_) => "input",
            Error::Provider(_) => "provider",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = ErrorBody {
            kind: self.kind(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
