//! HTTP surface for the document quality service.
//!
//! Routes are mounted below `API_ROOT_PATH` + `API_PREFIX` (by default
//! `/project/v1/doc-quality`):
//!
//! - `POST /quality` – Multipart upload with a `file` field. Returns the quality verdict
//!   `{ "valid": bool, "quality": { "structure", "metadata", "topic" } }`, or
//!   `{ "valid": false, "diagnose": "unsupported file type: ppt" }` for recognised types without
//!   a reader.
//! - `GET /health` – Liveness plus whether a topic model is loaded.

use crate::extraction::{DocType, DocTypeError};
use crate::quality::{EngineError, EngineHolder, QualityVerdict};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Build the HTTP router mounted at `root_path` + `prefix`.
pub fn create_router(engine: Arc<EngineHolder>, root_path: &str, prefix: &str) -> Router {
    let routes = Router::new()
        .route("/quality", post(assess_document))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(engine);

    let base = format!(
        "{}{}",
        root_path.trim_end_matches('/'),
        prefix.trim_end_matches('/')
    );
    if base.is_empty() {
        routes
    } else {
        Router::new().nest(&base, routes)
    }
}

/// Assess an uploaded document.
async fn assess_document(
    State(engine): State<Arc<EngineHolder>>,
    mut multipart: Multipart,
) -> Result<Json<QualityVerdict>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            upload = Some((file_name, bytes));
            break;
        }
    }
    let (file_name, bytes) = upload.ok_or(AppError::MissingFile)?;

    let doc_type = DocType::from_file_name(&file_name)?;
    let engine = engine.get_or_init().await?;
    let verdict = engine.validate_named(&bytes, doc_type, &file_name).await;

    tracing::info!(
        file_name = %file_name,
        %doc_type,
        bytes = bytes.len(),
        valid = verdict.is_valid(),
        "Quality request completed"
    );
    Ok(Json(verdict))
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    topic_model_loaded: bool,
}

async fn health(State(engine): State<Arc<EngineHolder>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        topic_model_loaded: engine
            .get()
            .is_some_and(|engine| engine.has_topic_model()),
    })
}

#[derive(Debug, Error)]
enum AppError {
    #[error("missing multipart field 'file'")]
    MissingFile,
    #[error("invalid multipart payload: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    UnsupportedType(#[from] DocTypeError),
    #[error("quality engine unavailable: {0}")]
    Engine(#[from] EngineError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingFile | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Engine(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Quality request failed");
        } else {
            tracing::debug!(error = %self, "Quality request rejected");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
