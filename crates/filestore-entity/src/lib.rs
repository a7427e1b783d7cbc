//! # filestore-entity
//!
//! Domain entity models for FileStore. Every struct in this crate
//! represents a database row or a domain value object: users and their
//! roles, stored files, and the append-only event trail.

pub mod event;
pub mod file;
pub mod query;
pub mod user;
