//! S3-compatible object store.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream as S3Body;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::BytesMut;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use filestore_core::config::storage::S3StorageConfig;
use filestore_core::error::{AppError, ErrorKind};
use filestore_core::result::AppResult;
use filestore_core::traits::storage::{ByteStream, ObjectStore};

/// Smallest part S3 accepts for all but the last part of a multipart upload.
const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

fn upstream<E>(context: &str, e: E) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = format!("{context}: {}", DisplayErrorContext(&e));
    AppError::with_source(ErrorKind::UpstreamStorage, message, e)
}

/// A multipart upload that has been started but not completed.
///
/// Dropping it while armed, for example when the caller's timeout cancels
/// `put`, aborts the upload in the background so S3 does not keep the
/// orphaned parts.
struct PendingMultipart {
    client: Client,
    bucket: String,
    key: String,
    upload_id: String,
    armed: bool,
}

impl PendingMultipart {
    fn disarm(mut self) {
        self.armed = false;
    }

    async fn abort(mut self) {
        self.armed = false;
        abort_multipart(&self.client, &self.bucket, &self.key, &self.upload_id).await;
    }
}

impl Drop for PendingMultipart {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(key = %self.key, upload_id = %self.upload_id, "No runtime to abort multipart upload");
            return;
        };
        let client = self.client.clone();
        let bucket = std::mem::take(&mut self.bucket);
        let key = std::mem::take(&mut self.key);
        let upload_id = std::mem::take(&mut self.upload_id);
        handle.spawn(async move {
            abort_multipart(&client, &bucket, &key, &upload_id).await;
        });
    }
}

async fn abort_multipart(client: &Client, bucket: &str, key: &str, upload_id: &str) {
    match client
        .abort_multipart_upload()
        .bucket(bucket)
        .key(key)
        .upload_id(upload_id)
        .send()
        .await
    {
        Ok(_) => debug!(key, upload_id, "Aborted multipart upload"),
        Err(e) => warn!(key, error = %DisplayErrorContext(&e), "Failed to abort multipart upload"),
    }
}

/// Object store backed by an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    public_base_url: String,
    part_size: usize,
}

impl S3ObjectStore {
    /// Build a client from configuration.
    ///
    /// Static credentials are used when `access_key` is set; otherwise the
    /// default AWS provider chain applies.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if !config.access_key.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "filestore-config",
            ));
        }
        if !config.endpoint.is_empty() {
            loader = loader.endpoint_url(config.endpoint.clone());
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "S3 object store initialized"
        );

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            part_size: config.multipart_part_size_bytes.max(MIN_PART_SIZE),
        })
    }

    /// Pull chunks into `buffer` until it holds a full part. Returns `true`
    /// once the body is exhausted.
    async fn fill(body: &mut ByteStream<'_>, buffer: &mut BytesMut, part_size: usize) -> AppResult<bool> {
        while buffer.len() < part_size {
            match body.next().await {
                Some(chunk) => {
                    let chunk = chunk.map_err(|e| {
                        AppError::with_source(ErrorKind::UpstreamStorage, "Upload stream failed", e)
                    })?;
                    buffer.extend_from_slice(&chunk);
                }
                None => return Ok(true),
            }
        }
        Ok(false)
    }

    async fn upload_parts(
        &self,
        key: &str,
        upload_id: &str,
        mut body: ByteStream<'_>,
        mut buffer: BytesMut,
    ) -> AppResult<u64> {
        let mut parts = Vec::new();
        let mut total = 0u64;
        let mut exhausted = false;

        loop {
            if !buffer.is_empty() {
                let data = buffer.split().freeze();
                total += data.len() as u64;
                let part_number = parts.len() as i32 + 1;

                let output = self
                    .client
                    .upload_part()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(upload_id)
                    .part_number(part_number)
                    .body(S3Body::from(data))
                    .send()
                    .await
                    .map_err(|e| upstream("S3 part upload failed", e))?;

                debug!(key, part_number, "Uploaded part");
                parts.push(
                    CompletedPart::builder()
                        .set_e_tag(output.e_tag().map(str::to_string))
                        .part_number(part_number)
                        .build(),
                );
            }
            if exhausted {
                break;
            }
            exhausted = Self::fill(&mut body, &mut buffer, self.part_size).await?;
        }

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| upstream("S3 multipart completion failed", e))?;

        Ok(total)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn put(&self, key: &str, mut body: ByteStream<'_>, content_type: &str) -> AppResult<u64> {
        let mut buffer = BytesMut::with_capacity(self.part_size);
        let exhausted = Self::fill(&mut body, &mut buffer, self.part_size).await?;

        if exhausted {
            let size = buffer.len() as u64;
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .content_type(content_type)
                .body(S3Body::from(buffer.freeze()))
                .send()
                .await
                .map_err(|e| upstream("S3 upload failed", e))?;
            debug!(key, bytes = size, "Stored object");
            return Ok(size);
        }

        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| upstream("S3 multipart start failed", e))?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| AppError::upstream_storage("S3 returned no upload id"))?
            .to_string();

        let pending = PendingMultipart {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            key: key.to_string(),
            upload_id: upload_id.clone(),
            armed: true,
        };

        match self.upload_parts(key, &upload_id, body, buffer).await {
            Ok(total) => {
                pending.disarm();
                debug!(key, bytes = total, "Stored object via multipart upload");
                Ok(total)
            }
            Err(e) => {
                pending.abort().await;
                Err(e)
            }
        }
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream<'static>> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    AppError::not_found(format!("Object not found: {key}"))
                } else {
                    upstream("S3 download failed", e)
                }
            })?;
        Ok(Box::pin(ReaderStream::new(output.body.into_async_read())))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| upstream("S3 delete failed", e))?;
        debug!(key, "Deleted object");
        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> AppResult<String> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| upstream("Invalid presign duration", e))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| upstream("S3 presign failed", e))?;
        Ok(request.uri().to_string())
    }

    fn location(&self, key: &str) -> String {
        if self.public_base_url.is_empty() {
            format!("s3://{}/{key}", self.bucket)
        } else {
            format!("{}/{}/{key}", self.public_base_url, self.bucket)
        }
    }
}
