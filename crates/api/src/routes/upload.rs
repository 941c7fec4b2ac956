//! File upload route.
//!
//! `POST /upload` takes a `multipart/form-data` body with a single `file`
//! field, buffers it to temp storage, forwards it to the media provider and
//! relays the provider's result.

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    routing::post,
};
use futures::StreamExt;
use mediarelay_core::provider::ProviderUpload;
use mediarelay_core::upload::{UploadError, UploadPhase};
use mediarelay_shared::AppError;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

use crate::{ApiError, AppState};

/// Form field carrying the file.
pub const FILE_FIELD: &str = "file";

/// Content type assumed when a part declares none.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Creates the upload routes.
pub fn routes(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_file))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
}

/// Classify a multipart read failure.
fn field_error(err: &MultipartError, max: u64) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { max }
    } else {
        UploadError::body(err.body_text())
    }
}

/// POST `/api/upload`
/// Buffer the `file` field and forward it to the media provider.
async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProviderUpload>, ApiError> {
    let mut multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let max = state.uploads.max_file_size();
    info!(phase = %UploadPhase::Received, "Upload request received");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| field_error(&e, max))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // A `file` field without a filename is a plain text field.
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let body = field.map(move |chunk| chunk.map_err(|e| field_error(&e, max)));
        let buffered = state
            .uploads
            .buffer(&original_name, &content_type, body)
            .await?;
        let result = state.uploads.relay(buffered).await?;

        return Ok(Json(result));
    }

    Err(UploadError::NoFile.into())
}
