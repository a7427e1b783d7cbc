//! File repository implementation.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use filestore_core::error::{AppError, ErrorKind};
use filestore_core::result::AppResult;
use filestore_core::types::{PageRequest, PageResponse, Sort};
use filestore_entity::event::{Event, NewEvent};
use filestore_entity::file::{CreateStorageFile, FileStatus, StorageFile};
use filestore_entity::query::{FileFilter, FileQuery, FileSortKey};

use super::event::append_event;
use crate::store::FileStore;

/// Repository for stored file metadata.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(
        &self,
        filter: FileFilter,
        sort: Sort<FileSortKey>,
        page: Option<PageRequest>,
    ) -> AppResult<(Vec<StorageFile>, u64)> {
        let mut conditions = Vec::new();
        let mut param_idx = 1u32;

        if filter.owner_id.is_some() {
            conditions.push(format!("owner_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.status.is_some() {
            conditions.push(format!("status = ${param_idx}"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let mut select_sql = format!(
            "SELECT * FROM files {where_clause} ORDER BY {}",
            order_by(sort)
        );
        if page.is_some() {
            select_sql.push_str(&format!(" LIMIT ${param_idx} OFFSET ${}", param_idx + 1));
        }
        let count_sql = format!("SELECT COUNT(*) FROM files {where_clause}");

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let mut select_query = sqlx::query_as::<_, StorageFile>(&select_sql);

        if let Some(owner) = filter.owner_id {
            count_query = count_query.bind(owner);
            select_query = select_query.bind(owner);
        }
        if let Some(status) = filter.status {
            count_query = count_query.bind(status);
            select_query = select_query.bind(status);
        }
        if let Some(page) = page {
            select_query = select_query
                .bind(page.sql_limit())
                .bind(page.sql_offset());
        }

        let files = select_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))?;

        let total = if page.is_some() {
            count_query.fetch_one(&self.pool).await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count files", e)
            })? as u64
        } else {
            files.len() as u64
        };

        Ok((files, total))
    }

    /// Explain why a guarded update touched no row.
    async fn missing_or_archived(conn: &mut PgConnection, id: Uuid) -> AppError {
        let status = sqlx::query_scalar::<_, FileStatus>("SELECT status FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await;
        match status {
            Ok(None) => AppError::not_found("File not found"),
            Ok(Some(_)) => AppError::conflict("File is archived"),
            Err(e) => AppError::with_source(ErrorKind::Database, "Failed to load file", e),
        }
    }

    async fn guarded_update(
        &self,
        id: Uuid,
        sql: &str,
        name: Option<&str>,
        event: NewEvent,
    ) -> AppResult<(StorageFile, Event)> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let mut query = sqlx::query_as::<_, StorageFile>(sql).bind(id);
        if let Some(name) = name {
            query = query.bind(name);
        }
        let updated = query
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file", e))?;

        let Some(file) = updated else {
            return Err(Self::missing_or_archived(&mut tx, id).await);
        };

        let recorded = append_event(&mut tx, file.id, &event).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit file update", e)
        })?;
        Ok((file, recorded))
    }
}

fn order_by(sort: Sort<FileSortKey>) -> String {
    let column = match sort.key {
        FileSortKey::Id => return format!("id {}", sort.direction.as_sql()),
        FileSortKey::Name => "name",
        FileSortKey::Status => "status",
        FileSortKey::CreatedAt => "created_at",
    };
    format!("{column} {}, id DESC", sort.direction.as_sql())
}

#[async_trait]
impl FileStore for FileRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<StorageFile>> {
        sqlx::query_as::<_, StorageFile>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    async fn list(&self, filter: FileFilter) -> AppResult<Vec<StorageFile>> {
        let (files, _) = self.fetch(filter, FileSortKey::DEFAULT_SORT, None).await?;
        Ok(files)
    }

    async fn page(&self, query: &FileQuery) -> AppResult<PageResponse<StorageFile>> {
        let (files, total) = self.fetch(query.filter, query.sort, Some(query.page)).await?;
        Ok(PageResponse::new(files, query.page, total))
    }

    async fn create_with_event(
        &self,
        data: &CreateStorageFile,
        event: NewEvent,
    ) -> AppResult<(StorageFile, Event)> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let file = sqlx::query_as::<_, StorageFile>(
            "INSERT INTO files (id, name, location, storage_key, content_type, size_bytes, status, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, 'ACTIVE', $7) RETURNING *",
        )
        .bind(data.id)
        .bind(&data.name)
        .bind(&data.location)
        .bind(&data.storage_key)
        .bind(&data.content_type)
        .bind(data.size_bytes)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::unauthorized("Owner no longer exists")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create file", e),
        })?;

        let recorded = append_event(&mut tx, file.id, &event).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit file creation", e)
        })?;
        Ok((file, recorded))
    }

    async fn rename_with_event(
        &self,
        id: Uuid,
        name: &str,
        event: NewEvent,
    ) -> AppResult<(StorageFile, Event)> {
        self.guarded_update(
            id,
            "UPDATE files SET name = $2, updated_at = now() \
             WHERE id = $1 AND status = 'ACTIVE' RETURNING *",
            Some(name),
            event,
        )
        .await
    }

    async fn archive_with_event(
        &self,
        id: Uuid,
        event: NewEvent,
    ) -> AppResult<(StorageFile, Event)> {
        self.guarded_update(
            id,
            "UPDATE files SET status = 'ARCHIVED', updated_at = now() \
             WHERE id = $1 AND status = 'ACTIVE' RETURNING *",
            None,
            event,
        )
        .await
    }
}
