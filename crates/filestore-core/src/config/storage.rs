//! Object storage configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend to use: `"s3"`, `"local"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Upper bound on an upload's wait for the object store, in seconds.
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_seconds: u64,
    /// Upper bound on presigned URL generation, in seconds.
    #[serde(default = "default_presign_timeout")]
    pub presign_timeout_seconds: u64,
    /// Upper bound on a physical delete, in seconds.
    #[serde(default = "default_delete_timeout")]
    pub delete_timeout_seconds: u64,
    /// Lifetime of download links, in minutes.
    #[serde(default = "default_download_ttl")]
    pub download_url_ttl_minutes: u64,
    /// Local filesystem storage configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// S3-compatible storage configuration.
    #[serde(default)]
    pub s3: S3StorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            upload_timeout_seconds: default_upload_timeout(),
            presign_timeout_seconds: default_presign_timeout(),
            delete_timeout_seconds: default_delete_timeout(),
            download_url_ttl_minutes: default_download_ttl(),
            local: LocalStorageConfig::default(),
            s3: S3StorageConfig::default(),
        }
    }
}

/// Local filesystem storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root path for local file storage.
    #[serde(default = "default_local_root")]
    pub root_path: String,
    /// Base URL under which `/storage/{key}` is reachable.
    #[serde(default = "default_local_base_url")]
    pub public_base_url: String,
    /// Secret used to sign local download links.
    #[serde(default = "default_signing_secret")]
    pub signing_secret: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
            public_base_url: default_local_base_url(),
            signing_secret: default_signing_secret(),
        }
    }
}

/// S3-compatible object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StorageConfig {
    /// S3 endpoint URL (for non-AWS services like MinIO).
    #[serde(default)]
    pub endpoint: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// S3 bucket name.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Access key ID. Empty means the default AWS credential chain.
    #[serde(default)]
    pub access_key: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_key: String,
    /// Base URL used to build the `location` of stored objects.
    #[serde(default)]
    pub public_base_url: String,
    /// Use path-style addressing (MinIO, LocalStack).
    #[serde(default = "default_true")]
    pub force_path_style: bool,
    /// Part size of streamed multipart uploads.
    #[serde(default = "default_part_size")]
    pub multipart_part_size_bytes: usize,
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            bucket: default_bucket(),
            access_key: String::new(),
            secret_key: String::new(),
            public_base_url: String::new(),
            force_path_style: default_true(),
            multipart_part_size_bytes: default_part_size(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_upload_timeout() -> u64 {
    300
}

fn default_presign_timeout() -> u64 {
    10
}

fn default_delete_timeout() -> u64 {
    15
}

fn default_download_ttl() -> u64 {
    15
}

fn default_local_root() -> String {
    "./data/objects".to_string()
}

fn default_local_base_url() -> String {
    "http://localhost:8080/storage".to_string()
}

fn default_signing_secret() -> String {
    "dev-local-signing-secret-change-me".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket() -> String {
    "files".to_string()
}

fn default_true() -> bool {
    true
}

fn default_part_size() -> usize {
    8 * 1024 * 1024
}
