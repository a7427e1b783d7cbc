//! User handlers: own profile and admin management.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use filestore_service::NewAccount;

use crate::dto::request::{CreateUserRequest, UpdateRolesRequest, UpdateStatusRequest};
use crate::dto::response::UserDto;
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /users/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Json<UserDto> {
    Json(state.users.me(&auth).into())
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<UserDto>>> {
    let users = state.admin.list(&auth).await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserDto>)> {
    let user = state
        .admin
        .create(
            &auth,
            NewAccount {
                username: req.username,
                password: req.password,
                roles: req.roles,
                status: req.status,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /users/{id}/roles
pub async fn update_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateRolesRequest>,
) -> ApiResult<Json<UserDto>> {
    let user = state.admin.update_roles(&auth, id, &req.roles).await?;
    Ok(Json(user.into()))
}

/// PATCH /users/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateStatusRequest>,
) -> ApiResult<Json<UserDto>> {
    let user = state
        .admin
        .update_status(&auth, id, req.status.as_deref())
        .await?;
    Ok(Json(user.into()))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.admin.delete(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
