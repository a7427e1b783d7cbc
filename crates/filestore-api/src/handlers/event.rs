//! Event handlers: the audit trail.

use axum::Json;
use axum::extract::{Query, State};

use filestore_core::types::PageResponse;

use crate::dto::request::EventFilterParams;
use crate::dto::response::EventDto;
use crate::error::ApiResult;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /events
pub async fn list_events(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<EventDto>>> {
    let events = state.events.list_for_actor(&auth).await?;
    Ok(Json(events.into_iter().map(EventDto::from).collect()))
}

/// GET /events/paged
pub async fn list_events_paged(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<EventFilterParams>,
) -> ApiResult<Json<PageResponse<EventDto>>> {
    let page = state
        .events
        .list_paged(
            &auth,
            filter.user_id,
            filter.status.as_deref(),
            pagination.page_request(),
            pagination.sort(),
        )
        .await?;
    Ok(Json(page.map(EventDto::from)))
}
