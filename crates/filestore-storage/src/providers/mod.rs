//! Object store backends.

pub mod local;
pub mod memory;
pub mod s3;

use std::sync::Arc;

use filestore_core::config::storage::StorageConfig;
use filestore_core::error::AppError;
use filestore_core::result::AppResult;
use filestore_core::traits::ObjectStore;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Build the configured backend.
pub async fn from_config(config: &StorageConfig) -> AppResult<Arc<dyn ObjectStore>> {
    match config.provider.as_str() {
        "s3" => Ok(Arc::new(S3ObjectStore::new(&config.s3).await?)),
        "local" => Ok(Arc::new(LocalObjectStore::new(&config.local).await?)),
        "memory" => Ok(Arc::new(MemoryObjectStore::new())),
        other => Err(AppError::configuration(format!(
            "Unknown storage provider: '{other}'"
        ))),
    }
}
