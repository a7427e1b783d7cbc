//! Error envelope completion.

use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ErrorBody;

/// Upper bound on a plain-text rejection body carried into the envelope.
const MAX_REJECTION_TEXT: usize = 16 * 1024;

/// Gives every 4xx/5xx response the JSON error envelope with the request
/// path filled in.
///
/// Responses built from [`crate::ApiError`] carry their [`ErrorBody`] as an
/// extension. Anything else (extractor rejections, 405s, timeouts) is
/// wrapped using its plain-text body, or the reason phrase when it has none.
pub async fn error_envelope(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let mut envelope = match parts.extensions.remove::<ErrorBody>() {
        Some(envelope) => envelope,
        None => {
            let is_text = parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.starts_with("text/plain"));
            let text = if is_text {
                to_bytes(body, MAX_REJECTION_TEXT)
                    .await
                    .ok()
                    .map(|b| String::from_utf8_lossy(&b).trim().to_string())
                    .filter(|t| !t.is_empty())
            } else {
                None
            };
            let reason = status.canonical_reason().unwrap_or("Error");
            ErrorBody::new(status, text.unwrap_or_else(|| reason.to_string()))
        }
    };
    envelope.path = path;

    let bytes = match serde_json::to_vec(&envelope) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize error envelope");
            return Response::from_parts(parts, Body::empty());
        }
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(bytes))
}
