//! Signed downloads of objects held on the local filesystem.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use filestore_core::error::AppError;
use filestore_core::traits::storage::ObjectStore;

use crate::dto::request::SignedDownloadParams;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /storage/{*key}?expires=..&signature=..
///
/// The signature is the credential; no bearer token is required.
pub async fn serve_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<SignedDownloadParams>,
) -> ApiResult<Response> {
    let Some(store) = state.local_objects.as_ref() else {
        return Err(AppError::not_found("Object not found").into());
    };

    store.verify_download(&key, params.expires, &params.signature)?;
    let stream = store.get(&key).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(stream),
    )
        .into_response())
}
