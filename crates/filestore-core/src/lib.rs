//! # filestore-core
//!
//! Core crate for FileStore. Contains configuration schemas, the unified
//! error system, pagination/sorting types, the object-store trait and the
//! bounded persistence pool that keeps blocking-style data access off the
//! request runtime.
//!
//! This crate has **no** internal dependencies on other FileStore crates.

pub mod config;
pub mod error;
pub mod offload;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use offload::PersistencePool;
pub use result::AppResult;
