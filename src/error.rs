//! Error taxonomy for the HTTP surface.
//!
//! The design collapses every backend failure into a single `BadRequest`
//! with a fixed message: the caller is never told whether the document id
//! was wrong, the sheet was not shared, or the backend was unreachable.
//! The collapse lives in one typed conversion so it stays testable on its
//! own.

use crate::backend::BackendError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The one message every backend failure surfaces as.
pub const BAD_REQUEST_MESSAGE: &str = "Please provide a valid spreadsheet ID and ensure the spreadsheet is shared with the Google Service account.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Backend failure or unusable request parameter. HTTP 400.
    BadRequest(String),
    /// Out-of-range worksheet or row index. HTTP 404.
    NotFound(String),
    /// Unexpected failure in request handling. HTTP 500.
    Internal(String),
}

impl ApiError {
    /// The uniform error every backend failure collapses into.
    pub fn backend() -> Self {
        ApiError::BadRequest(BAD_REQUEST_MESSAGE.to_string())
    }

    pub fn invalid_param(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "Bad Request",
            ApiError::NotFound(_) => "Not Found",
            ApiError::Internal(_) => "Internal Server Error",
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Internal(message) => message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl std::error::Error for ApiError {}

/// Every backend failure mode, the handshake included, becomes the same
/// `BadRequest`. The underlying cause is logged server-side only.
impl From<BackendError> for ApiError {
    fn from(error: BackendError) -> Self {
        tracing::warn!(error = %error, "backend operation failed");
        crate::metrics::METRICS.record_backend_error(&error);
        ApiError::backend()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: u16,
    message: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            status: status.as_u16(),
            message: self.message().to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}
