//! Object store trait for pluggable blob backends.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// A byte stream used for reading and writing object contents.
///
/// The lifetime lets request bodies (e.g. a multipart field borrowing the
/// request) stream straight into the store without being buffered.
pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send + 'a>>;

/// Durable blob storage supporting put, get, delete and presigned reads.
///
/// Implementations exist for S3-compatible services, the local filesystem
/// and memory. Errors are reported as
/// [`ErrorKind::UpstreamStorage`](crate::error::ErrorKind::UpstreamStorage).
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Backend name (e.g., "s3", "local").
    fn provider_type(&self) -> &str;

    /// Stream `body` into the object at `key`. Returns the number of bytes written.
    async fn put(&self, key: &str, body: ByteStream<'_>, content_type: &str) -> AppResult<u64>;

    /// Open the object at `key` for reading.
    async fn get(&self, key: &str) -> AppResult<ByteStream<'static>>;

    /// Remove the object at `key`. Removing a missing object is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Issue a URL granting read access to `key` for `ttl`.
    async fn presign_get(&self, key: &str, ttl: Duration) -> AppResult<String>;

    /// Public location recorded for an object stored under `key`.
    fn location(&self, key: &str) -> String;
}
