//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/files` | Upload a document (multipart field `file`) and index it |
//! | `GET`  | `/files?limit=&offset=` | Paginated listing of indexed chunks |
//! | `POST` | `/chat/{question}?k=` | Answer a question with cited sources |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "file is required" } }
//! ```
//!
//! | Status | Codes |
//! |--------|-------|
//! | 400 | `bad_request`, `invalid_input`, `unsupported_format`, `decode_error` |
//! | 500 | `index_write_failure`, `internal` |
//! | 502 | `retrieval_failure`, `generation_failure` |
//! | 504 | `timeout` |
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use docqa_core::index::DEFAULT_LIST_LIMIT;
use docqa_core::models::{AnswerResult, ExtraMetadata, IndexPage, IngestionReport};

use crate::app::App;
use crate::config::Config;
use crate::loader::{extension_of, MIME_DOCX, MIME_PDF};

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];
const ALLOWED_CONTENT_TYPES: [&str; 2] = [MIME_PDF, MIME_DOCX];

pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let app = App::from_config(config).await?;
    let bind_addr = config.server.bind.clone();

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "docqa server listening");
    println!("docqa server listening on http://{}", bind_addr);

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

pub fn router(app: App) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/files", post(handle_upload).get(handle_list))
        .route("/chat/{question}", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(app)
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

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<docqa_core::Error> for AppError {
    fn from(err: docqa_core::Error) -> Self {
        use docqa_core::Error;
        let status = match &err {
            Error::InvalidInput(_) | Error::UnsupportedFormat(_) | Error::Decode { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Retrieval(_) | Error::Generation(_) => StatusCode::BAD_GATEWAY,
            Error::IndexWrite(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /files ============

async fn handle_upload(
    State(app): State<App>,
    mut multipart: Multipart,
) -> Result<Json<IngestionReport>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| bad_request("file must have a filename"))?;
        let content_type = field.content_type().map(str::to_string);
        check_upload(&filename, content_type.as_deref())?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("failed to read upload: {}", e)))?;

        let mut extra = ExtraMetadata::new();
        extra.insert("uploaded_at".to_string(), chrono::Utc::now().to_rfc3339());

        let report = app.ingestor.ingest(&bytes, &filename, &extra).await?;
        return Ok(Json(report));
    }

    Err(bad_request("file is required"))
}

fn check_upload(filename: &str, content_type: Option<&str>) -> Result<(), AppError> {
    let ext = extension_of(filename);
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(bad_request(format!(
            "Invalid file type '{}'. Only PDF and Word documents are allowed.",
            filename
        )));
    }
    match content_type {
        Some(ct) if ALLOWED_CONTENT_TYPES.contains(&ct) => Ok(()),
        other => Err(bad_request(format!(
            "Invalid content type {:?}. Only PDF and Word documents are allowed.",
            other.unwrap_or("")
        ))),
    }
}

// ============ GET /files ============

#[derive(Deserialize)]
struct ListParams {
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn handle_list(
    State(app): State<App>,
    Query(params): Query<ListParams>,
) -> Result<Json<IndexPage>, AppError> {
    let page = app
        .index
        .list_all(
            params.limit.unwrap_or(DEFAULT_LIST_LIMIT),
            params.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(page))
}

// ============ POST /chat/{question} ============

#[derive(Deserialize)]
struct ChatParams {
    k: Option<usize>,
}

async fn handle_chat(
    State(app): State<App>,
    Path(question): Path<String>,
    Query(params): Query<ChatParams>,
) -> Result<Json<AnswerResult>, AppError> {
    let result = app.synthesizer.answer(&question, params.k).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_check_accepts_pdf_and_docx() {
        assert!(check_upload("a.pdf", Some(MIME_PDF)).is_ok());
        assert!(check_upload("b.DOCX", Some(MIME_DOCX)).is_ok());
    }

    #[test]
    fn upload_check_rejects_other_types() {
        let err = check_upload("notes.txt", Some("text/plain")).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "bad_request");

        let err = check_upload("a.pdf", Some("text/plain")).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        assert!(check_upload("a.pdf", None).is_err());
    }

    #[test]
    fn pipeline_errors_map_to_statuses() {
        use docqa_core::Error;
        let cases = [
            (Error::invalid_input("x"), StatusCode::BAD_REQUEST),
            (Error::UnsupportedFormat("doc".into()), StatusCode::BAD_REQUEST),
            (Error::decode("a.pdf", "bad"), StatusCode::BAD_REQUEST),
            (Error::Timeout(5), StatusCode::GATEWAY_TIMEOUT),
            (Error::Retrieval("down".into()), StatusCode::BAD_GATEWAY),
            (Error::Generation("down".into()), StatusCode::BAD_GATEWAY),
            (Error::IndexWrite("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Internal("bug".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let code = err.code();
            let app_err = AppError::from(err);
            assert_eq!(app_err.status, status);
            assert_eq!(app_err.code, code);
        }
    }
}
