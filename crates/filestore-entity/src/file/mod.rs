//! Stored file entities.

pub mod model;
pub mod status;

pub use model::{CreateStorageFile, StorageFile};
pub use status::FileStatus;
