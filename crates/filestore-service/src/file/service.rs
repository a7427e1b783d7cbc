//! File registry: every state transition of a stored file.
//!
//! Upload writes the object first and records metadata only once the bytes
//! are durable. Delete goes the other way round: the physical delete is
//! attempted, but the file is archived and its `DELETED` event written even
//! when that attempt fails.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use filestore_auth::{Operation, ResolvedIdentity, Scope, enforce};
use filestore_core::config::storage::StorageConfig;
use filestore_core::error::{AppError, ErrorKind};
use filestore_core::offload::PersistencePool;
use filestore_core::result::AppResult;
use filestore_core::traits::storage::{ByteStream, ObjectStore};
use filestore_core::types::{PageRequest, PageResponse, Sort};
use filestore_database::store::FileStore;
use filestore_entity::event::{EventKind, NewEvent};
use filestore_entity::file::{CreateStorageFile, FileStatus, StorageFile};
use filestore_entity::query::{FileFilter, FileQuery, FileSortKey};
use filestore_storage::{clean_filename, storage_key};

/// Content type recorded when the client sends none.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Upper bounds on waits for the object store.
#[derive(Debug, Clone, Copy)]
pub struct StorageTimeouts {
    /// Streaming an upload into the store.
    pub upload: Duration,
    /// Generating a download link.
    pub presign: Duration,
    /// Removing an object.
    pub delete: Duration,
    /// Lifetime of issued download links.
    pub download_ttl: Duration,
}

impl StorageTimeouts {
    /// Timeouts from storage configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            upload: Duration::from_secs(config.upload_timeout_seconds),
            presign: Duration::from_secs(config.presign_timeout_seconds),
            delete: Duration::from_secs(config.delete_timeout_seconds),
            download_ttl: Duration::from_secs(config.download_url_ttl_minutes * 60),
        }
    }
}

impl Default for StorageTimeouts {
    fn default() -> Self {
        Self::from_config(&StorageConfig::default())
    }
}

/// Wrap a store failure as `UpstreamStorage` unless it already is one.
fn storage_failure(context: &str, e: AppError) -> AppError {
    if e.kind == ErrorKind::UpstreamStorage {
        e
    } else {
        AppError::with_source(ErrorKind::UpstreamStorage, context, e)
    }
}

/// Owns file metadata and its transitions ACTIVE → ARCHIVED.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    files: Arc<dyn FileStore>,
    objects: Arc<dyn ObjectStore>,
    pool: PersistencePool,
    timeouts: StorageTimeouts,
}

impl FileRegistry {
    /// Creates a new file registry.
    pub fn new(
        files: Arc<dyn FileStore>,
        objects: Arc<dyn ObjectStore>,
        pool: PersistencePool,
        timeouts: StorageTimeouts,
    ) -> Self {
        Self {
            files,
            objects,
            pool,
            timeouts,
        }
    }

    /// Stream a new file into the object store and register it.
    ///
    /// Nothing is recorded unless the object store accepted every byte.
    pub async fn upload(
        &self,
        actor: &ResolvedIdentity,
        display_name: &str,
        content_type: Option<&str>,
        body: ByteStream<'_>,
    ) -> AppResult<StorageFile> {
        enforce(Some(actor), None, Operation::Authenticated)?;

        let name = clean_filename(display_name);
        if name.is_empty() {
            return Err(AppError::invalid_input("Empty filename"));
        }
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let key = storage_key(actor.id(), &name, Utc::now(), Uuid::new_v4());

        let written = match tokio::time::timeout(
            self.timeouts.upload,
            self.objects.put(&key, body, &content_type),
        )
        .await
        {
            Ok(result) => result.map_err(|e| storage_failure("Object store upload failed", e))?,
            Err(_) => {
                // The store may hold some or all of the bytes already.
                self.discard_object(&key).await;
                return Err(AppError::upstream_storage("Object store upload timed out"));
            }
        };

        let data = CreateStorageFile {
            id: Uuid::now_v7(),
            name,
            location: self.objects.location(&key),
            storage_key: key.clone(),
            content_type,
            size_bytes: i64::try_from(written).unwrap_or(i64::MAX),
            owner_id: actor.id(),
        };
        let event = NewEvent::new(actor.id(), EventKind::Created);

        let files = self.files.clone();
        let recorded = self
            .pool
            .run(async move { files.create_with_event(&data, event).await })
            .await;

        let (file, event) = match recorded {
            Ok(pair) => pair,
            Err(e) => {
                // The object has no row pointing at it; drop it.
                self.discard_object(&key).await;
                return Err(e);
            }
        };

        info!(
            user_id = %actor.id(),
            file_id = %file.id,
            kind = %event.kind,
            bytes = written,
            "File uploaded"
        );
        Ok(file)
    }

    /// Best-effort removal of an object no row refers to.
    async fn discard_object(&self, key: &str) {
        match tokio::time::timeout(self.timeouts.delete, self.objects.delete(key)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(key, error = %e, "Failed to remove unregistered object"),
            Err(_) => warn!(key, "Timed out removing unregistered object"),
        }
    }

    /// Change a file's display name.
    pub async fn rename(
        &self,
        actor: &ResolvedIdentity,
        id: Uuid,
        new_name: &str,
    ) -> AppResult<StorageFile> {
        let new_name = new_name.trim().to_string();
        if new_name.is_empty() {
            return Err(AppError::invalid_input("Empty name"));
        }

        let file = self.load(id).await?;
        enforce(Some(actor), Some(file.owner_id), Operation::Mutate)?;

        let event = NewEvent::new(actor.id(), EventKind::Updated)
            .with_message(format!("Renamed from '{}'", file.name));
        let files = self.files.clone();
        let (file, event) = self
            .pool
            .run(async move { files.rename_with_event(id, &new_name, event).await })
            .await?;

        info!(user_id = %actor.id(), file_id = %file.id, kind = %event.kind, "File renamed");
        Ok(file)
    }

    /// Archive a file, removing its object on a best-effort basis.
    pub async fn delete(&self, actor: &ResolvedIdentity, id: Uuid) -> AppResult<()> {
        let file = self.load(id).await?;
        enforce(Some(actor), Some(file.owner_id), Operation::Mutate)?;
        if !file.is_active() {
            return Err(AppError::conflict("File is archived"));
        }

        let removed = match tokio::time::timeout(
            self.timeouts.delete,
            self.objects.delete(&file.storage_key),
        )
        .await
        {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(file_id = %id, key = %file.storage_key, error = %e, "Object delete failed, archiving anyway");
                false
            }
            Err(_) => {
                warn!(file_id = %id, key = %file.storage_key, "Object delete timed out, archiving anyway");
                false
            }
        };

        let mut event = NewEvent::new(actor.id(), EventKind::Deleted);
        if !removed {
            event = event.with_message("Object removal pending");
        }
        let files = self.files.clone();
        let (file, event) = self
            .pool
            .run(async move { files.archive_with_event(id, event).await })
            .await?;

        info!(
            user_id = %actor.id(),
            file_id = %file.id,
            kind = %event.kind,
            object_removed = removed,
            "File archived"
        );
        Ok(())
    }

    /// Fetch a file in any status.
    pub async fn get_by_id(&self, actor: &ResolvedIdentity, id: Uuid) -> AppResult<StorageFile> {
        enforce(Some(actor), None, Operation::Authenticated)?;
        self.load(id).await
    }

    /// Issue a time-limited download URL for a file's object.
    pub async fn presign_download(&self, actor: &ResolvedIdentity, id: Uuid) -> AppResult<String> {
        let file = self.load(id).await?;
        enforce(Some(actor), Some(file.owner_id), Operation::Mutate)?;
        if !file.is_active() {
            return Err(AppError::conflict("File is archived"));
        }

        match tokio::time::timeout(
            self.timeouts.presign,
            self.objects
                .presign_get(&file.storage_key, self.timeouts.download_ttl),
        )
        .await
        {
            Ok(result) => result.map_err(|e| storage_failure("Failed to issue download link", e)),
            Err(_) => Err(AppError::upstream_storage("Download link generation timed out")),
        }
    }

    /// Every file visible to `actor`, newest first.
    pub async fn list(&self, actor: &ResolvedIdentity) -> AppResult<Vec<StorageFile>> {
        let filter = Self::visible(actor, None)?;
        let files = self.files.clone();
        self.pool.run(async move { files.list(filter).await }).await
    }

    /// One page of files visible to `actor`.
    ///
    /// `sort` is `field[,asc|desc]`; `status` narrows further.
    pub async fn list_paged(
        &self,
        actor: &ResolvedIdentity,
        page: PageRequest,
        sort: Option<&str>,
        status: Option<&str>,
    ) -> AppResult<PageResponse<StorageFile>> {
        let sort = Sort::parse_or(sort, FileSortKey::DEFAULT_SORT)?;
        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<FileStatus>()?),
            None => None,
        };
        let query = FileQuery {
            filter: Self::visible(actor, status)?,
            sort,
            page,
        };

        let files = self.files.clone();
        self.pool.run(async move { files.page(&query).await }).await
    }

    /// Visibility filter: privileged actors see everything, others their
    /// own files, ACTIVE unless a status is requested.
    fn visible(actor: &ResolvedIdentity, status: Option<FileStatus>) -> AppResult<FileFilter> {
        Ok(match enforce(Some(actor), None, Operation::ListMany)? {
            Scope::All => FileFilter {
                owner_id: None,
                status,
            },
            Scope::OwnedBy(owner) => FileFilter {
                owner_id: Some(owner),
                status: Some(status.unwrap_or(FileStatus::Active)),
            },
        })
    }

    async fn load(&self, id: Uuid) -> AppResult<StorageFile> {
        let files = self.files.clone();
        self.pool
            .run(async move { files.find_by_id(id).await })
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))
    }
}
