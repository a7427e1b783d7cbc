//! # filestore-database
//!
//! PostgreSQL connection management, the store traits the services depend
//! on, their sqlx implementations and an in-memory implementation of the
//! same contracts.
//!
//! Every file mutation is paired with its audit event inside one store
//! call (one SQL transaction, or one lock in memory). Events cannot be
//! appended any other way.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryDatabase;
pub use store::{EventStore, FileStore, UserDeletion, UserStore};
