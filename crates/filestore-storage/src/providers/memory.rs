//! In-memory object store with switchable faults.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;

use filestore_core::error::{AppError, ErrorKind};
use filestore_core::result::AppResult;
use filestore_core::traits::storage::{ByteStream, ObjectStore};

#[derive(Debug, Default)]
struct Faults {
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    fail_presign: AtomicBool,
    put_delay_ms: AtomicU64,
    delete_delay_ms: AtomicU64,
    presign_delay_ms: AtomicU64,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

/// Object store backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    faults: Arc<Faults>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent put fail.
    pub fn set_fail_puts(&self, fail: bool) {
        self.faults.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent delete fail.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.faults.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent presign fail.
    pub fn set_fail_presign(&self, fail: bool) {
        self.faults.fail_presign.store(fail, Ordering::SeqCst);
    }

    /// Delay the acknowledgement of puts. The object is already stored
    /// while the caller waits.
    pub fn set_put_delay(&self, delay: Duration) {
        self.faults
            .put_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Delay deletes before they complete.
    pub fn set_delete_delay(&self, delay: Duration) {
        self.faults
            .delete_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Delay presigning before it completes.
    pub fn set_presign_delay(&self, delay: Duration) {
        self.faults
            .presign_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Whether an object exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().map(|o| o.contains_key(key)).unwrap_or(false)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.lock().map(|o| o.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content and type stored under `key`.
    pub fn object(&self, key: &str) -> Option<(Bytes, String)> {
        self.lock()
            .ok()?
            .get(key)
            .map(|o| (o.data.clone(), o.content_type.clone()))
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, StoredObject>>> {
        self.objects
            .lock()
            .map_err(|_| AppError::internal("Memory object store lock poisoned"))
    }

    async fn pause(millis: &AtomicU64) {
        let millis = millis.load(Ordering::SeqCst);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &str, mut body: ByteStream<'_>, content_type: &str) -> AppResult<u64> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                AppError::with_source(ErrorKind::UpstreamStorage, "Upload stream failed", e)
            })?;
            buffer.extend_from_slice(&chunk);
        }

        if self.faults.fail_puts.load(Ordering::SeqCst) {
            return Err(AppError::upstream_storage("Simulated put failure"));
        }

        let size = buffer.len() as u64;
        self.lock()?.insert(
            key.to_string(),
            StoredObject {
                data: buffer.freeze(),
                content_type: content_type.to_string(),
            },
        );
        Self::pause(&self.faults.put_delay_ms).await;
        Ok(size)
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream<'static>> {
        let data = self
            .lock()?
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| AppError::not_found(format!("Object not found: {key}")))?;
        Ok(Box::pin(futures::stream::once(async move { Ok::<_, std::io::Error>(data) })))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        Self::pause(&self.faults.delete_delay_ms).await;
        if self.faults.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::upstream_storage("Simulated delete failure"));
        }
        self.lock()?.remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> AppResult<String> {
        Self::pause(&self.faults.presign_delay_ms).await;
        if self.faults.fail_presign.load(Ordering::SeqCst) {
            return Err(AppError::upstream_storage("Simulated presign failure"));
        }
        let expires = chrono::Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(format!("{}?expires={expires}", self.location(key)))
    }

    fn location(&self, key: &str) -> String {
        format!("memory://objects/{key}")
    }
}
