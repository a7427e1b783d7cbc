//! Route handlers organized by domain.

pub mod auth;
pub mod event;
pub mod file;
pub mod health;
pub mod storage;
pub mod user;
