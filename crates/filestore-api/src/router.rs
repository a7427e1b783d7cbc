//! Route definitions for the FileStore HTTP API.
//!
//! Routes are grouped by domain. The router receives `AppState` and passes
//! it to all handlers via Axum's `State` extractor.

use axum::http::Uri;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use filestore_core::error::AppError;

use crate::error::ApiError;
use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_upload = usize::try_from(state.config.server.max_upload_size_bytes).unwrap_or(usize::MAX);
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(file_routes())
        .merge(event_routes())
        .merge(storage_routes())
        .merge(health_routes())
        .fallback(no_route)
        .layer(axum_middleware::from_fn(middleware::envelope::error_envelope))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

async fn no_route(uri: Uri) -> ApiError {
    AppError::not_found(format!("No route for {}", uri.path())).into()
}

/// Registration and login (no auth required)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
}

/// Own profile and admin user management
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(handlers::user::me))
        .route(
            "/users",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route("/users/{id}", delete(handlers::user::delete_user))
        .route("/users/{id}/roles", put(handlers::user::update_roles))
        .route("/users/{id}/status", patch(handlers::user::update_status))
}

/// File registry
fn file_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/files",
            get(handlers::file::list_files).post(handlers::file::upload_file),
        )
        .route("/files/paged", get(handlers::file::list_files_paged))
        .route(
            "/files/{id}",
            get(handlers::file::get_file)
                .put(handlers::file::rename_file)
                .delete(handlers::file::delete_file),
        )
        .route("/files/{id}/download", get(handlers::file::download_file))
}

/// Audit trail
fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(handlers::event::list_events))
        .route("/events/paged", get(handlers::event::list_events_paged))
}

/// Signed local object downloads
fn storage_routes() -> Router<AppState> {
    Router::new().route("/storage/{*key}", get(handlers::storage::serve_object))
}

/// Health check (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health_check))
}
