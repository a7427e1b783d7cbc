//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use filestore_entity::event::Event;
use filestore_entity::file::StorageFile;
use filestore_entity::user::User;
use filestore_service::AuthSession;

/// File metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDto {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub status: String,
    pub owner_id: Uuid,
}

impl From<StorageFile> for FileDto {
    fn from(file: StorageFile) -> Self {
        Self {
            id: file.id,
            status: file.status.to_string(),
            name: file.name,
            location: file.location,
            owner_id: file.owner_id,
        }
    }
}

/// Audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_id: Uuid,
    /// Event kind: `CREATED`, `UPDATED` or `DELETED`.
    pub status: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Event> for EventDto {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            file_id: event.file_id,
            status: event.kind.to_string(),
            message: event.message,
            created_at: event.created_at,
        }
    }
}

/// User summary. Never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub status: String,
    pub roles: Vec<String>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            status: user.status.to_string(),
            roles: user.role_names(),
            username: user.username,
        }
    }
}

/// Issued bearer token plus the account it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    /// Always `Bearer`.
    pub token_type: String,
    pub expires_in_seconds: i64,
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token.token,
            token_type: "Bearer".to_string(),
            expires_in_seconds: session.token.expires_in_seconds,
            user_id: session.user.id,
            roles: session.user.role_names(),
            username: session.user.username,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// `connected` or `unavailable`.
    pub database: String,
}
