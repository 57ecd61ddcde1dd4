//! Domain error types for the upload server.
//!
//! Every failure kind renders through one envelope:
//! `{"success": false, "message": ..., "errorCode": ..., "error": ...}`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The upload request carried no file
    #[error("No file uploaded.")]
    MissingFile,

    /// Malformed request (multipart framing, duplicate file fields)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Content or QR encoding failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Object storage host unreachable or rejected the upload
    #[error("Storage upload error: {0}")]
    StorageUpload(String),

    /// Record store unreachable, rejected a write, or could not parse an id
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// No record exists for the requested identifier
    #[error("{0} not found")]
    RecordNotFound(String),

    /// Unexpected failure outside the pipeline stages
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable code carried in the error envelope.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingFile => "MISSING_FILE",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Encoding(_) => "ENCODING_ERROR",
            AppError::StorageUpload(_) => "STORAGE_UPLOAD_ERROR",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::RecordNotFound(_) => "RECORD_NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Human-readable summary; the underlying detail goes in `error`.
    fn summary(&self) -> &'static str {
        match self {
            AppError::MissingFile => "No file uploaded.",
            AppError::InvalidInput(_) => "Invalid upload request",
            AppError::Encoding(_) | AppError::StorageUpload(_) => "File upload failed",
            AppError::Persistence(_) | AppError::Internal(_) => "Internal server error",
            AppError::RecordNotFound(_) => "File not found",
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            AppError::MissingFile | AppError::RecordNotFound(_) => None,
            AppError::InvalidInput(msg)
            | AppError::Encoding(msg)
            | AppError::StorageUpload(msg)
            | AppError::Persistence(msg)
            | AppError::Internal(msg) => Some(msg.clone()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingFile | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Encoding(_)
            | AppError::StorageUpload(_)
            | AppError::Persistence(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error_code = self.error_code(), "{}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            success: false,
            message: self.summary().to_string(),
            error_code: self.error_code().to_string(),
            error: self.detail(),
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_code, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Persistence(err.to_string())
    }
}
