//! Local filesystem object store.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use filestore_core::config::storage::LocalStorageConfig;
use filestore_core::error::{AppError, ErrorKind};
use filestore_core::result::AppResult;
use filestore_core::traits::storage::{ByteStream, ObjectStore};

use crate::signer::UrlSigner;

/// Object store rooted at a local directory.
///
/// Download links point at the server's own `/storage/{key}` route and carry
/// an HMAC signature checked by [`LocalObjectStore::verify_download`].
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
    signer: UrlSigner,
}

impl LocalObjectStore {
    /// Create a store, making sure the root directory exists.
    pub async fn new(config: &LocalStorageConfig) -> AppResult<Self> {
        let root = PathBuf::from(&config.root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            signer: UrlSigner::new(config.signing_secret.as_bytes())?,
        })
    }

    /// Resolve a key to a path inside the root.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(AppError::invalid_input(format!("Invalid storage key: {key}")));
        }
        Ok(self.root.join(relative))
    }

    async fn ensure_parent(path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::UpstreamStorage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Check a download link previously issued by [`ObjectStore::presign_get`].
    pub fn verify_download(&self, key: &str, expires: i64, signature: &str) -> AppResult<()> {
        self.signer.verify(key, expires, signature, Utc::now())
    }

    async fn write_all(path: &Path, mut body: ByteStream<'_>) -> AppResult<u64> {
        let mut file = fs::File::create(path).await.map_err(|e| {
            AppError::with_source(ErrorKind::UpstreamStorage, "Failed to create object file", e)
        })?;

        let mut total_bytes = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                AppError::with_source(ErrorKind::UpstreamStorage, "Upload stream failed", e)
            })?;
            total_bytes += chunk.len() as u64;
            file.write_all(&chunk).await.map_err(|e| {
                AppError::with_source(ErrorKind::UpstreamStorage, "Failed to write chunk", e)
            })?;
        }

        file.flush().await.map_err(|e| {
            AppError::with_source(ErrorKind::UpstreamStorage, "Failed to flush object file", e)
        })?;
        Ok(total_bytes)
    }
}

/// A `.part` file that is removed unless the write completes.
///
/// Covers the caller dropping `put` midway (an upload timeout, a closed
/// connection) as well as ordinary write errors.
#[derive(Debug)]
struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// The file was renamed into place; leave it alone.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed partial object"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove partial object"),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn put(&self, key: &str, body: ByteStream<'_>, _content_type: &str) -> AppResult<u64> {
        let full_path = self.resolve(key)?;
        Self::ensure_parent(&full_path).await?;

        // Readers never observe a partially written object.
        let mut partial = full_path.clone().into_os_string();
        partial.push(".part");
        let partial = PartialFile::new(PathBuf::from(partial));

        let written = Self::write_all(partial.path(), body).await?;
        fs::rename(partial.path(), &full_path).await.map_err(|e| {
            AppError::with_source(ErrorKind::UpstreamStorage, "Failed to finalize object", e)
        })?;
        partial.disarm();

        debug!(key, bytes = written, "Stored object");
        Ok(written)
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream<'static>> {
        let full_path = self.resolve(key)?;
        let file = fs::File::open(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Object not found: {key}"))
            } else {
                AppError::with_source(
                    ErrorKind::UpstreamStorage,
                    format!("Failed to open object: {key}"),
                    e,
                )
            }
        })?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_path = self.resolve(key)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(key, "Deleted object");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::UpstreamStorage,
                format!("Failed to delete object: {key}"),
                e,
            )),
        }
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> AppResult<String> {
        self.resolve(key)?;
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        let signature = self.signer.sign(key, expires);
        Ok(format!(
            "{}?expires={expires}&signature={signature}",
            self.location(key)
        ))
    }

    fn location(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }
}
