//! HTTP API for the document assistant.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload` | Multipart upload; extracts, mines clauses, and reindexes |
//! | `POST` | `/ask` | Grounded question against the indexed document |
//! | `POST` | `/compare` | Multipart upload of two documents; returns a unified diff |
//! | `GET`  | `/health` | Health check (version, temp dir writability) |
//! | `GET`  | `/stats` | Uptime, request counters, active index snapshot |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "no_active_index", "message": "upload a document first" } }
//! ```
//!
//! Codes: `bad_request` (400), `no_active_index` (400), `extraction_failed` (422),
//! `content_empty` (422), `comparison_failed` (422), `generation_failed` (502),
//! `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the browser frontend
//! can talk to the service directly.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::{AsyncWriteExt, BufWriter};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::error::ServiceError;
use crate::models::QueryResult;
use crate::pipeline::{safe_filename, DocumentService, StatsReport, UploadReport};

const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    service: Arc<DocumentService>,
}

/// Starts the HTTP server on `[server].bind` and runs until the process
/// is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let service = Arc::new(DocumentService::from_config(config)?);
    run_server_with_service(config, service).await
}

/// Like [`run_server`] but with a pre-built service, so callers can
/// substitute capabilities.
pub async fn run_server_with_service(
    config: &Config,
    service: Arc<DocumentService>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
        service,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/upload", post(handle_upload))
        .route("/ask", post(handle_ask))
        .route("/compare", post(handle_compare))
        .route("/health", get(handle_health))
        .route("/stats", get(handle_stats))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state);

    info!(addr = %bind_addr, "server listening");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        let (status, code) = match err {
            ServiceError::NoActiveIndex => (StatusCode::BAD_REQUEST, "no_active_index"),
            ServiceError::Extraction(_) => (StatusCode::UNPROCESSABLE_ENTITY, "extraction_failed"),
            ServiceError::ContentEmpty => (StatusCode::UNPROCESSABLE_ENTITY, "content_empty"),
            ServiceError::Comparison(_) => (StatusCode::UNPROCESSABLE_ENTITY, "comparison_failed"),
            ServiceError::Generation(_) => (StatusCode::BAD_GATEWAY, "generation_failed"),
            ServiceError::Save(_)
            | ServiceError::ClauseIdentification(_)
            | ServiceError::Index(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        AppError {
            status,
            code,
            message,
        }
    }
}

// ============ Multipart plumbing ============

/// A multipart file streamed to a temp file. The temp file is deleted
/// when this is dropped, on every exit path.
struct SavedUpload {
    filename: String,
    file: NamedTempFile,
}

/// Pull the next file field out of the multipart body and stream it to a
/// temp file in the configured directory.
async fn save_next_field(
    multipart: &mut Multipart,
    config: &Config,
    expected: &str,
) -> Result<SavedUpload, AppError> {
    let mut field = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("malformed multipart body: {}", e)))?
        .ok_or_else(|| bad_request(format!("missing file field '{}'", expected)))?;

    let filename = safe_filename(field.file_name().unwrap_or_default());

    let tmp = NamedTempFile::with_prefix_in("upload_", &config.upload.tmp_dir)
        .map_err(|e| AppError::from(ServiceError::Save(e.to_string())))?;
    let out = tokio::fs::OpenOptions::new()
        .write(true)
        .open(tmp.path())
        .await
        .map_err(|e| AppError::from(ServiceError::Save(e.to_string())))?;
    let mut writer = BufWriter::with_capacity(config.upload.read_buffer_bytes, out);

    let mut total = 0usize;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| bad_request(format!("upload interrupted: {}", e)))?
    {
        total += chunk.len();
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::from(ServiceError::Save(e.to_string())))?;
    }
    writer
        .flush()
        .await
        .map_err(|e| AppError::from(ServiceError::Save(e.to_string())))?;

    if total == 0 {
        return Err(bad_request(format!("file field '{}' is empty", expected)));
    }

    Ok(SavedUpload {
        filename,
        file: tmp,
    })
}

// ============ POST /upload ============

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadReport>, AppError> {
    let upload = save_next_field(&mut multipart, &state.config, "file").await?;
    let report = state
        .service
        .ingest(&upload.filename, upload.file.path())
        .await?;
    Ok(Json(report))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<QueryResult>, AppError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(bad_request("question must not be empty"));
    }
    let result = state.service.ask(question).await?;
    Ok(Json(result))
}

// ============ POST /compare ============

#[derive(Serialize)]
struct CompareResponse {
    comparison_lines: Vec<String>,
}

async fn handle_compare(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CompareResponse>, AppError> {
    let first = save_next_field(&mut multipart, &state.config, "file1").await?;
    let second = save_next_field(&mut multipart, &state.config, "file2").await?;
    let comparison_lines = state
        .service
        .compare(
            &first.filename,
            first.file.path(),
            &second.filename,
            second.file.path(),
        )
        .await?;
    Ok(Json(CompareResponse { comparison_lines }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    tmp_dir_writable: bool,
    read_buffer_bytes: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let tmp_dir_writable = NamedTempFile::new_in(&state.config.upload.tmp_dir).is_ok();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tmp_dir_writable,
        read_buffer_bytes: state.config.upload.read_buffer_bytes,
    })
}

// ============ GET /stats ============

async fn handle_stats(State(state): State<AppState>) -> Json<StatsReport> {
    Json(state.service.stats().await)
}
