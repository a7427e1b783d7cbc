//! # filestore-service
//!
//! Business logic service layer for FileStore. Each service orchestrates
//! the stores, the object store and the access policy to implement one
//! group of use cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references. Every store call is
//! dispatched through the [`PersistencePool`](filestore_core::PersistencePool).

pub mod event;
pub mod file;
pub mod user;

pub use event::EventLedger;
pub use file::{FileRegistry, StorageTimeouts};
pub use user::{AdminUserService, AuthSession, NewAccount, UserService};
