//! # filestore-auth
//!
//! Authentication and authorization for FileStore.
//!
//! ## Modules
//!
//! - `jwt`: signed bearer token issuance and verification
//! - `password`: Argon2id password hashing
//! - `authenticator`: turns an `Authorization` header into a [`ResolvedIdentity`]
//! - `identity`: the per-request resolved identity and its authorities
//! - `access`: the pure access policy deciding allow / narrow / deny

pub mod access;
pub mod authenticator;
pub mod identity;
pub mod jwt;
pub mod password;

pub use access::{Decision, Denial, Operation, Scope, authorize, enforce};
pub use authenticator::{Authentication, Authenticator};
pub use identity::ResolvedIdentity;
pub use jwt::{Claims, IssuedToken, TokenError, TokenService};
pub use password::PasswordHasher;
