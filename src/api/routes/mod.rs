//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`extract`] - Archive upload, extraction and inspection
//! - [`system`] - Health, OpenAPI, upload form

use crate::error::ApiError;
use axum::{
    Json,
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

mod extract;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use extract::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Default number of lines shown per statement by `POST /inspect`
pub const DEFAULT_PREVIEW_LINES: usize = 25;
/// Smallest accepted `preview_lines`
pub const MIN_PREVIEW_LINES: usize = 5;
/// Largest accepted `preview_lines`
pub const MAX_PREVIEW_LINES: usize = 200;

/// Query parameters for POST /inspect
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InspectQuery {
    /// Lines kept per statement (default: 25, clamped to 5..=200)
    pub preview_lines: Option<usize>,
}

impl InspectQuery {
    /// Requested preview length, defaulted and clamped
    pub fn lines(&self) -> usize {
        self.preview_lines
            .unwrap_or(DEFAULT_PREVIEW_LINES)
            .clamp(MIN_PREVIEW_LINES, MAX_PREVIEW_LINES)
    }
}

/// A file received in the `file` field of a multipart upload
#[derive(Debug)]
pub(crate) struct Upload {
    pub(crate) file_name: String,
    pub(crate) bytes: Vec<u8>,
}

/// Pull the `file` field out of a multipart body
///
/// Other fields are ignored. The error side is a ready-to-send 400 (or 413 when the
/// body exceeds the upload limit).
pub(crate) async fn read_upload(multipart: &mut Multipart) -> Result<Upload, Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e.status(), e.body_text())),
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e.status(), e.body_text()))?;

        return Ok(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    Err((
        StatusCode::BAD_REQUEST,
        Json(ApiError::new(
            "missing_file",
            "No archive provided in 'file' field",
        )),
    )
        .into_response())
}

fn multipart_error(status: StatusCode, message: String) -> Response {
    let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "payload_too_large"
    } else {
        "invalid_upload"
    };
    let status = if status.is_client_error() {
        status
    } else {
        StatusCode::BAD_REQUEST
    };

    (
        status,
        Json(ApiError::new(
            code,
            format!("Failed to read upload: {message}"),
        )),
    )
        .into_response()
}
