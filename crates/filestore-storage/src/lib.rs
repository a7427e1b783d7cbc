//! # filestore-storage
//!
//! [`ObjectStore`](filestore_core::traits::ObjectStore) backends:
//!
//! - `s3`: any S3-compatible service through `aws-sdk-s3`, streaming
//!   large bodies as multipart uploads
//! - `local`: files under a root directory, with signed download links
//! - `memory`: a map with fault injection, for tests
//!
//! plus the deterministic storage key layout shared by all of them.

pub mod key;
pub mod providers;
pub mod signer;

pub use key::{clean_filename, sanitize_key_segment, storage_key};
pub use providers::{LocalObjectStore, MemoryObjectStore, S3ObjectStore, from_config};
pub use signer::UrlSigner;
