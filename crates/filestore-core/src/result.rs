//! Convenience result type alias for FileStore.

use crate::error::AppError;

/// A specialized `Result` type for FileStore operations.
pub type AppResult<T> = Result<T, AppError>;
