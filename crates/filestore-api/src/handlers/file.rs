//! File handlers: upload, list, rename, delete, download.

use std::sync::{Arc, Mutex};

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use futures::StreamExt;
use uuid::Uuid;

use filestore_core::error::AppError;
use filestore_core::traits::storage::ByteStream;
use filestore_core::types::PageResponse;

use crate::dto::request::{FileFilterParams, RenameFileRequest};
use crate::dto::response::FileDto;
use crate::error::ApiResult;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// Multipart field carrying the file body.
const FILE_FIELD: &str = "file";

/// POST /files
///
/// Streams the `file` part straight into the object store; the body is
/// never held in memory as a whole.
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<FileDto>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_input(format!("Malformed multipart body: {}", e.body_text())))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);

        // Body read failures surface as bad input, not as storage errors.
        let body_error: Arc<Mutex<Option<String>>> = Arc::default();
        let seen = body_error.clone();
        let body: ByteStream<'_> = Box::pin(field.map(move |chunk| {
            chunk.map_err(|e| {
                let text = e.body_text();
                if let Ok(mut slot) = seen.lock() {
                    slot.get_or_insert_with(|| text.clone());
                }
                std::io::Error::other(text)
            })
        }));

        let result = state
            .files
            .upload(&auth, &file_name, content_type.as_deref(), body)
            .await;
        let read_error = body_error.lock().ok().and_then(|mut slot| slot.take());
        return match (result, read_error) {
            (Ok(file), _) => Ok((StatusCode::CREATED, Json(file.into()))),
            (Err(_), Some(text)) => Err(AppError::invalid_input(text).into()),
            (Err(e), None) => Err(e.into()),
        };
    }

    Err(AppError::invalid_input(format!("Missing multipart field '{FILE_FIELD}'")).into())
}

/// GET /files
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<FileDto>>> {
    let files = state.files.list(&auth).await?;
    Ok(Json(files.into_iter().map(FileDto::from).collect()))
}

/// GET /files/paged
pub async fn list_files_paged(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<FileFilterParams>,
) -> ApiResult<Json<PageResponse<FileDto>>> {
    let page = state
        .files
        .list_paged(
            &auth,
            pagination.page_request(),
            pagination.sort(),
            filter.status.as_deref(),
        )
        .await?;
    Ok(Json(page.map(FileDto::from)))
}

/// GET /files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FileDto>> {
    let file = state.files.get_by_id(&auth, id).await?;
    Ok(Json(file.into()))
}

/// PUT /files/{id}
pub async fn rename_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<RenameFileRequest>,
) -> ApiResult<Json<FileDto>> {
    let file = state.files.rename(&auth, id, &req.name).await?;
    Ok(Json(file.into()))
}

/// DELETE /files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.files.delete(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /files/{id}/download
///
/// Redirects to a short-lived presigned URL.
pub async fn download_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let url = state.files.presign_download(&auth, id).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}
