//! Extraction handlers: upload an archive, get a ZIP or a summary back.

use super::{InspectQuery, Upload, read_upload};
use crate::api::AppState;
use crate::error::Error;
use crate::pipeline::{Extraction, extract};
use crate::types::InputArchive;
use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};

/// Response header carrying the number of extracted statements
pub const QUERIES_HEADER: HeaderName = HeaderName::from_static("x-bip-queries");
/// Response header carrying the number of collected templates
pub const TEMPLATES_HEADER: HeaderName = HeaderName::from_static("x-bip-templates");

/// POST /extract - Extract an archive and download the result
#[utoipa::path(
    post,
    path = "/api/v1/extract",
    tag = "extraction",
    request_body(content = Vec<u8>, description = "Archive upload (.xdmz, .xdrz or .xdoz) in the 'file' field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Packaged artifacts", content_type = "application/zip", body = Vec<u8>),
        (status = 400, description = "Missing or unreadable upload", body = crate::error::ApiError),
        (status = 413, description = "Upload exceeds the configured limit", body = crate::error::ApiError),
        (status = 415, description = "Unsupported file type", body = crate::error::ApiError),
        (status = 422, description = "Corrupt archive, missing datamodel or invalid XML", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn extract_archive(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let upload = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    let Extraction { archive, summary } = match run_extraction(&state, upload).await {
        Ok(result) => result,
        Err(e) => return e.into_response(),
    };

    let disposition = content_disposition(&archive.file_name);

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (QUERIES_HEADER, summary.query_count().to_string()),
            (TEMPLATES_HEADER, summary.templates.len().to_string()),
        ],
        archive.bytes,
    )
        .into_response()
}

/// POST /inspect - Extract an archive and describe the result
#[utoipa::path(
    post,
    path = "/api/v1/inspect",
    tag = "extraction",
    params(InspectQuery),
    request_body(content = Vec<u8>, description = "Archive upload (.xdmz, .xdrz or .xdoz) in the 'file' field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Extraction summary with truncated SQL", body = crate::types::ExtractionSummary),
        (status = 400, description = "Missing or unreadable upload", body = crate::error::ApiError),
        (status = 413, description = "Upload exceeds the configured limit", body = crate::error::ApiError),
        (status = 415, description = "Unsupported file type", body = crate::error::ApiError),
        (status = 422, description = "Corrupt archive, missing datamodel or invalid XML", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn inspect_archive(
    State(state): State<AppState>,
    Query(query): Query<InspectQuery>,
    mut multipart: Multipart,
) -> Response {
    let upload = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    match run_extraction(&state, upload).await {
        Ok(Extraction { mut summary, .. }) => {
            summary.truncate_statements(query.lines());
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// `attachment` disposition with an ASCII `filename` and the exact UTF-8 `filename*`
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();

    if fallback == file_name {
        format!("attachment; filename=\"{file_name}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(file_name)
        )
    }
}

/// Validate the upload and run the pipeline on the blocking pool
async fn run_extraction(state: &AppState, upload: Upload) -> crate::Result<Extraction> {
    let input = InputArchive::new(upload.file_name, upload.bytes)?;
    let config = state.config.clone();

    tokio::task::spawn_blocking(move || extract(&input, &config.extraction))
        .await
        .map_err(|e| Error::Other(format!("extraction task panicked: {e}")))?
}
