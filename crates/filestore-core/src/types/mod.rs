//! Core type definitions used across the FileStore workspace.

pub mod pagination;
pub mod sorting;

pub use pagination::{PageRequest, PageResponse};
pub use sorting::{Sort, SortDirection, SortKey};
