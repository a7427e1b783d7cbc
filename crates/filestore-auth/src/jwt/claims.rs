//! JWT claims structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Claim names owned by the token service; extra claims cannot override them.
pub(crate) const RESERVED_CLAIMS: [&str; 5] = ["sub", "uid", "roles", "iat", "exp"];

/// JWT claims payload.
///
/// `roles` is a snapshot taken at issuance. Authorization never reads it;
/// the authenticator loads the live role set instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,
    /// User ID.
    pub uid: Uuid,
    /// Role names at issuance.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Opaque additional claims, e.g. account status.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Returns the username from the subject claim.
    pub fn username(&self) -> &str {
        &self.sub
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Checks whether this token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
