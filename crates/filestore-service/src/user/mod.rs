//! Account registration, login and administration.

pub mod admin;
pub mod service;

pub use admin::{AdminUserService, NewAccount};
pub use service::{AuthSession, UserService};
