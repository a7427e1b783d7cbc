//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Signing secret used when nothing else is configured. Development only.
pub const DEVELOPMENT_JWT_SECRET: &str = "dev-secret-change-me-please-at-least-32-bytes";

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256), at least 32 bytes.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Token TTL in minutes.
    #[serde(default = "default_ttl")]
    pub jwt_ttl_minutes: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Administrator account created at startup when absent.
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

impl AuthConfig {
    /// Whether the built-in development secret is in use.
    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEVELOPMENT_JWT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_ttl_minutes: default_ttl(),
            password_min_length: default_password_min(),
            bootstrap_admin: None,
        }
    }
}

/// Credentials of the bootstrap administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdminConfig {
    /// Login name.
    pub username: String,
    /// Plain-text password, hashed before it is stored.
    pub password: String,
}

fn default_jwt_secret() -> String {
    DEVELOPMENT_JWT_SECRET.to_string()
}

fn default_ttl() -> u64 {
    120
}

fn default_password_min() -> usize {
    6
}
