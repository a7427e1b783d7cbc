//! Maps domain `AppError` to HTTP responses.
//!
//! Every failure leaves the server as the same JSON envelope. Handlers build
//! it without the request path; [`crate::middleware::envelope`] fills the
//! path in on the way out and wraps framework rejections that never passed
//! through here.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use filestore_core::error::{AppError, ErrorKind};

/// Handler result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// Standard API error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// HTTP status code.
    pub status: u16,
    /// HTTP reason phrase.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Request path.
    pub path: String,
    /// RFC 3339 time the error was produced.
    pub timestamp: String,
}

impl ErrorBody {
    /// Envelope for `status` with an empty path.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: message.into(),
            path: String::new(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// An [`AppError`] on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

/// Status code for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::UpstreamStorage => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::Serialization => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.0;
        let status = status_for(error.kind);

        let message = if error.kind.is_internal() {
            tracing::error!(
                kind = %error.kind,
                error = %error.message,
                source = ?error.source,
                "Internal server error"
            );
            "Internal server error".to_string()
        } else {
            if error.kind == ErrorKind::UpstreamStorage {
                tracing::warn!(error = %error.message, source = ?error.source, "Object store failure");
            }
            error.message
        };

        let body = ErrorBody::new(status, message);
        let mut response = (status, Json(body.clone())).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response.extensions_mut().insert(body);
        response
    }
}
