//! Stored file entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::FileStatus;

/// Metadata of a file held in the object store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StorageFile {
    /// Unique file identifier (time-ordered).
    pub id: Uuid,
    /// Display name, changed by rename.
    pub name: String,
    /// Public location of the object. Never changes once set.
    pub location: String,
    /// Object key within the store, used for deletes and presigning.
    pub storage_key: String,
    /// MIME type recorded at upload.
    pub content_type: String,
    /// Object size in bytes.
    pub size_bytes: i64,
    /// Lifecycle state.
    pub status: FileStatus,
    /// Owning user, fixed at creation.
    pub owner_id: Uuid,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl StorageFile {
    /// Whether the file may still be renamed or deleted.
    pub fn is_active(&self) -> bool {
        self.status == FileStatus::Active
    }

    /// Whether `user_id` owns this file.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// Data required to register an uploaded object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStorageFile {
    /// Pre-generated identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Public location.
    pub location: String,
    /// Object key.
    pub storage_key: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Owning user.
    pub owner_id: Uuid,
}
