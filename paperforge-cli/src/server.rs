//! HTTP surface: document upload and completion recovery.

use anyhow::{Context, Result};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use paperforge_core::{
    assemble_paper, recover_json, DocumentFormat, DocumentProcessor, ExtractionError, PaperRequest,
    RawDocument, UploadResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const BIND_ENV: &str = "PAPERFORGE_BIND";
pub const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Multipart framing on top of the file size cap
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub struct AppState {
    pub processor: DocumentProcessor,
    pub recovery_timeout: Duration,
}

impl AppState {
    pub fn new(processor: DocumentProcessor) -> Self {
        Self {
            processor,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.processor.config().limits.max_file_size_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/parse-document",
            post(parse_document).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/recover-json", post(recover_completion))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("bind upload server failed: {bind}"))?;
    let local_addr = listener
        .local_addr()
        .context("resolve upload server local addr failed")?;
    info!("🚀 PaperForge listening on http://{local_addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("upload server stopped unexpectedly")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("👋 Shutting down");
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// A body cut off at `DefaultBodyLimit` reads as an oversized file
fn multipart_rejection(err: MultipartError, limit: u64) -> Response {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let rejection = ExtractionError::UploadTooLarge { limit };
        warn!("🚫 Upload rejected: {rejection}");
        return error_response(StatusCode::BAD_REQUEST, rejection.to_string());
    }
    error_response(StatusCode::BAD_REQUEST, err.body_text())
}

/// First file field of the form, preferring one named `file`
async fn read_upload(mut multipart: Multipart, limit: u64) -> Result<Option<RawDocument>, Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_rejection(err, limit))?
    {
        let field_name = field.name().unwrap_or("");
        if field.file_name().is_none() && field_name != "file" {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| {
                DocumentFormat::from_path(std::path::Path::new(&file_name))
                    .map(|format| format.mime_type().to_string())
            })
            .unwrap_or_default();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| multipart_rejection(err, limit))?;
        return Ok(Some(RawDocument::new(bytes.to_vec(), mime_type, file_name)));
    }
    Ok(None)
}

async fn parse_document(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let limit = state.processor.config().limits.max_file_size_bytes;
    let document = match read_upload(multipart, limit).await {
        Ok(Some(document)) => document,
        Ok(None) => return error_response(StatusCode::BAD_REQUEST, "No file uploaded"),
        Err(response) => return response,
    };

    let worker_state = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || worker_state.processor.process(&document)).await;

    match result {
        Ok(Ok(cleaned)) => Json(UploadResponse::from(cleaned)).into_response(),
        Ok(Err(e)) if e.is_request_rejection() => {
            warn!("🚫 Upload rejected: {e}");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Ok(Err(e)) => {
            warn!("⚠️  Upload could not be parsed: {e}");
            Json(UploadResponse::failure(e)).into_response()
        }
        Err(join_error) => {
            error!("❌ Extraction task failed: {join_error}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Document parsing failed")
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecoverParams {
    fallback: bool,
}

/// Body of `/api/recover-json?fallback=true`
#[derive(Debug, Deserialize)]
struct AssembleBody {
    #[serde(default)]
    completion: Option<String>,
    #[serde(default)]
    request: PaperRequest,
}

async fn recover_completion(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecoverParams>,
    body: String,
) -> Response {
    let timeout = state.recovery_timeout;

    if params.fallback {
        let assemble: AssembleBody = match serde_json::from_str(&body) {
            Ok(assemble) => assemble,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("Invalid request body: {e}")),
        };
        let task = tokio::task::spawn_blocking(move || {
            assemble_paper(assemble.completion.as_deref(), &assemble.request)
        });
        return match tokio::time::timeout(timeout, task).await {
            Ok(Ok(outcome)) => Json(outcome).into_response(),
            Ok(Err(join_error)) => {
                error!("❌ Paper assembly task failed: {join_error}");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Paper assembly failed")
            }
            Err(_) => error_response(StatusCode::GATEWAY_TIMEOUT, "Paper assembly timed out"),
        };
    }

    let task = tokio::task::spawn_blocking(move || recover_json(&body));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(value))) => Json(value).into_response(),
        Ok(Ok(Err(e))) => {
            warn!("⚠️  Completion recovery failed: {}", e.detail());
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Ok(Err(join_error)) => {
            error!("❌ Recovery task failed: {join_error}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "JSON recovery failed")
        }
        Err(_) => error_response(StatusCode::GATEWAY_TIMEOUT, "JSON recovery timed out"),
    }
}
