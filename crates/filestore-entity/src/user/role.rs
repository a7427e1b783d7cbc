//! Role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named capability tags. Reference data, seeded by migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular account; sees and mutates only its own files.
    User,
    /// May read and mutate any file and browse users.
    Moderator,
    /// Full control, including user administration.
    Admin,
}

impl Role {
    /// All roles in privilege order.
    pub const ALL: [Role; 3] = [Role::User, Role::Moderator, Role::Admin];

    /// Return the role as its canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Moderator => "MODERATOR",
            Self::Admin => "ADMIN",
        }
    }

    /// The authority string granted by this role, e.g. `ROLE_ADMIN`.
    pub fn authority(&self) -> String {
        format!("ROLE_{}", self.as_str())
    }

    /// Whether the role grants access to every user's resources.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = filestore_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "MODERATOR" => Ok(Self::Moderator),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(filestore_core::AppError::invalid_input(format!(
                "Unknown role: {s}"
            ))),
        }
    }
}

/// Parse a list of role names, defaulting to `[USER]` when empty.
/// The result is sorted and free of duplicates.
pub fn resolve_roles<S: AsRef<str>>(names: &[S]) -> Result<Vec<Role>, filestore_core::AppError> {
    if names.is_empty() {
        return Ok(vec![Role::User]);
    }
    let mut roles = names
        .iter()
        .map(|n| n.as_ref().parse::<Role>())
        .collect::<Result<Vec<_>, _>>()?;
    roles.sort();
    roles.dedup();
    Ok(roles)
}
