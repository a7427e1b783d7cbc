//! Event ledger repository implementation.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use filestore_core::error::{AppError, ErrorKind};
use filestore_core::result::AppResult;
use filestore_core::types::{PageRequest, PageResponse, Sort};
use filestore_entity::event::{Event, NewEvent};
use filestore_entity::query::{EventFilter, EventQuery, EventSortKey};

use crate::store::EventStore;

/// Append one event inside the caller's transaction.
///
/// Only the file repository calls this, as part of the mutation the event
/// describes.
pub(crate) async fn append_event(
    conn: &mut PgConnection,
    file_id: Uuid,
    event: &NewEvent,
) -> AppResult<Event> {
    sqlx::query_as::<_, Event>(
        "INSERT INTO events (id, user_id, file_id, kind, message) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(event.user_id)
    .bind(file_id)
    .bind(event.kind)
    .bind(&event.message)
    .fetch_one(conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to append event", e))
}

/// Repository for reading the event ledger.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new event repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(
        &self,
        filter: EventFilter,
        sort: Sort<EventSortKey>,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<Event>, u64)> {
        let mut conditions = Vec::new();
        let mut param_idx = 1u32;

        if filter.actor_id.is_some() {
            conditions.push(format!("user_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.user_id.is_some() {
            conditions.push(format!("user_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.kind.is_some() {
            conditions.push(format!("kind = ${param_idx}"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let mut select_sql = format!(
            "SELECT * FROM events {where_clause} ORDER BY {}",
            order_by(sort)
        );
        if page.is_some() {
            select_sql.push_str(&format!(" LIMIT ${param_idx} OFFSET ${}", param_idx + 1));
        }
        let count_sql = format!("SELECT COUNT(*) FROM events {where_clause}");

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let mut select_query = sqlx::query_as::<_, Event>(&select_sql);

        if let Some(actor) = filter.actor_id {
            count_query = count_query.bind(actor);
            select_query = select_query.bind(actor);
        }
        if let Some(user) = filter.user_id {
            count_query = count_query.bind(user);
            select_query = select_query.bind(user);
        }
        if let Some(kind) = filter.kind {
            count_query = count_query.bind(kind);
            select_query = select_query.bind(kind);
        }
        if let Some(page) = page {
            select_query = select_query
                .bind(page.sql_limit())
                .bind(page.sql_offset());
        }

        let events = select_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list events", e))?;

        let total = if page.is_some() {
            count_query.fetch_one(&self.pool).await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count events", e)
            })? as u64
        } else {
            events.len() as u64
        };

        Ok((events, total))
    }
}

fn order_by(sort: Sort<EventSortKey>) -> String {
    let column = match sort.key {
        EventSortKey::Id => return format!("id {}", sort.direction.as_sql()),
        EventSortKey::Status => "kind",
        EventSortKey::CreatedAt => "created_at",
        EventSortKey::UserId => "user_id",
    };
    format!("{column} {}, id DESC", sort.direction.as_sql())
}

#[async_trait]
impl EventStore for EventRepository {
    async fn list(&self, filter: EventFilter) -> AppResult<Vec<Event>> {
        let (events, _) = self.fetch(filter, EventSortKey::DEFAULT_SORT, None).await?;
        Ok(events)
    }

    async fn page(&self, query: &EventQuery) -> AppResult<PageResponse<Event>> {
        let (events, total) = self.fetch(query.filter, query.sort, Some(query.page)).await?;
        Ok(PageResponse::new(events, query.page, total))
    }
}
