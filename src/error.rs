//! Error types for bip-extract
//!
//! This module provides error handling for the extraction pipeline and the HTTP surface:
//! - Domain errors for each pipeline stage (dispatch, archive reading, XML parsing, packaging)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for bip-extract operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bip-extract
///
/// Every pipeline failure surfaces as one of these variants. None of them are retried:
/// parsing a local upload has no transient failure mode.
#[derive(Debug, Error)]
pub enum Error {
    /// The upload's extension is not one of `.xdmz`, `.xdrz`, `.xdoz`
    #[error("unsupported file type: {file_name} (expected .xdmz, .xdrz or .xdoz)")]
    UnsupportedFormat {
        /// The uploaded file name
        file_name: String,
    },

    /// The archive (or one of its members) is not a readable ZIP
    #[error("corrupt archive {archive}: {reason}")]
    CorruptArchive {
        /// Name of the archive that failed to open
        archive: String,
        /// The reason reading failed
        reason: String,
    },

    /// An XDMZ has no `*_datamodel.xdm` member
    #[error("no *_datamodel.xdm found inside {archive}")]
    DatamodelNotFound {
        /// Name of the data model archive
        archive: String,
    },

    /// A datamodel member is not well-formed XML
    #[error("invalid XML in {member}: {reason}")]
    InvalidXml {
        /// The archive member being parsed
        member: String,
        /// Parser error message
        reason: String,
    },

    /// Building the output ZIP failed
    #[error("failed to package {path}: {reason}")]
    Packaging {
        /// Path inside the working directory being packaged
        path: PathBuf,
        /// The reason packaging failed
        reason: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "template_extensions")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn corrupt(archive: impl Into<String>, reason: impl ToString) -> Self {
        Error::CorruptArchive {
            archive: archive.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_xml(member: impl Into<String>, reason: impl ToString) -> Self {
        Error::InvalidXml {
            member: member.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn packaging(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Packaging {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "datamodel_not_found",
///     "message": "no *_datamodel.xdm found inside Sales.xdmz",
///     "details": {
///       "archive": "Sales.xdmz"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "unsupported_format", "invalid_xml")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context (archive or member name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Config { .. } => 400,

            // 415 Unsupported Media Type
            Error::UnsupportedFormat { .. } => 415,

            // 422 Unprocessable Entity - upload is the right type but unusable
            Error::CorruptArchive { .. } => 422,
            Error::DatamodelNotFound { .. } => 422,
            Error::InvalidXml { .. } => 422,

            // 500 Internal Server Error
            Error::Packaging { .. } => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::UnsupportedFormat { .. } => "unsupported_format",
            Error::CorruptArchive { .. } => "corrupt_archive",
            Error::DatamodelNotFound { .. } => "datamodel_not_found",
            Error::InvalidXml { .. } => "invalid_xml",
            Error::Packaging { .. } => "packaging_error",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::UnsupportedFormat { file_name } => Some(serde_json::json!({
                "file_name": file_name,
            })),
            Error::CorruptArchive { archive, .. } | Error::DatamodelNotFound { archive } => {
                Some(serde_json::json!({
                    "archive": archive,
                }))
            }
            Error::InvalidXml { member, .. } => Some(serde_json::json!({
                "member": member,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
