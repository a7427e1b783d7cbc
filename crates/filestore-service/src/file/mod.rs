//! File registry: upload, rename, archive and download links.

pub mod service;

pub use service::{FileRegistry, StorageTimeouts};
