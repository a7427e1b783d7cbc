//! User repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use filestore_core::error::{AppError, ErrorKind};
use filestore_core::result::AppResult;
use filestore_entity::user::{CreateUser, Role, User, UserStatus};

use crate::store::{UserDeletion, UserStore};

/// Columns of a user joined with its aggregated role names.
const SELECT_USER: &str = "SELECT u.id, u.username, u.password_hash, u.status, u.created_at, u.updated_at, \
     COALESCE(array_agg(ur.role_name ORDER BY ur.role_name) FILTER (WHERE ur.role_name IS NOT NULL), '{}') AS roles \
     FROM users u LEFT JOIN user_roles ur ON ur.user_id = u.id";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    status: UserStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    roles: Vec<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let mut roles: Vec<Role> = row.roles.iter().filter_map(|r| r.parse().ok()).collect();
        roles.sort();
        roles.dedup();
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            status: row.status,
            roles,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for user accounts and role assignments.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn replace_roles(conn: &mut PgConnection, id: Uuid, roles: &[Role]) -> AppResult<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear roles", e))?;

        let names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
        sqlx::query("INSERT INTO user_roles (user_id, role_name) SELECT $1, UNNEST($2::text[])")
            .bind(id)
            .bind(&names)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to assign roles", e))?;
        Ok(())
    }

    async fn lock_user(conn: &mut PgConnection, id: Uuid) -> AppResult<bool> {
        let found = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock user", e))?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE u.id = $1 GROUP BY u.id");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(User::from))
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE u.username = $1 GROUP BY u.id");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(User::from))
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
            })
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let sql = format!("{SELECT_USER} GROUP BY u.id ORDER BY u.username");
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(User::from).collect())
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list users", e))
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let id = Uuid::now_v7();
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query("INSERT INTO users (id, username, password_hash, status) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(&data.username)
            .bind(&data.password_hash)
            .bind(data.status)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err)
                    if db_err.constraint() == Some("users_username_key") =>
                {
                    AppError::conflict("Username already exists")
                }
                _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
            })?;

        Self::replace_roles(&mut tx, id, &data.roles).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit user creation", e)
        })?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Created user vanished"))
    }

    async fn set_roles(&self, id: Uuid, roles: &[Role]) -> AppResult<Option<User>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        if !Self::lock_user(&mut tx, id).await? {
            return Ok(None);
        }
        Self::replace_roles(&mut tx, id, roles).await?;
        sqlx::query("UPDATE users SET updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to touch user", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit role update", e)
        })?;

        self.find_by_id(id).await
    }

    async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<Option<User>> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            "UPDATE users SET status = $2, updated_at = now() WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update status", e))?;

        match updated {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn delete_if_unreferenced(&self, id: Uuid) -> AppResult<UserDeletion> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        if !Self::lock_user(&mut tx, id).await? {
            return Ok(UserDeletion::NotFound);
        }

        let referenced: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM files WHERE owner_id = $1) \
             OR EXISTS (SELECT 1 FROM events WHERE user_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check references", e))?;

        if referenced {
            return Ok(UserDeletion::Referenced);
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await;

        match result {
            Ok(_) => {}
            // A file inserted between the check and the delete still trips the FK.
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_foreign_key_violation() => {
                return Ok(UserDeletion::Referenced);
            }
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Database,
                    "Failed to delete user",
                    e,
                ));
            }
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit user deletion", e)
        })?;
        Ok(UserDeletion::Deleted)
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}
