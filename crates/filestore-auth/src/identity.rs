//! The resolved identity attached to an authenticated request.

use uuid::Uuid;

use filestore_entity::user::{Role, User};

/// An authenticated user plus the authorities derived from its live roles.
///
/// Produced once per request by the authenticator and carried through the
/// handlers; nothing downstream re-resolves the principal.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    user: User,
    authorities: Vec<String>,
}

impl ResolvedIdentity {
    /// Derive authorities (`ROLE_<NAME>`) from the user's current roles.
    pub fn new(user: User) -> Self {
        let authorities = user.roles.iter().map(Role::authority).collect();
        Self { user, authorities }
    }

    /// The user record as loaded for this request.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// User ID.
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    /// Login name.
    pub fn username(&self) -> &str {
        &self.user.username
    }

    /// Granted authorities, e.g. `ROLE_USER`.
    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }

    /// Whether the authority is granted.
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    /// Whether the role's authority is granted.
    pub fn has_role(&self, role: Role) -> bool {
        self.has_authority(&role.authority())
    }

    /// Holds `ROLE_ADMIN`.
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Holds `ROLE_MODERATOR` or `ROLE_ADMIN`.
    pub fn is_privileged(&self) -> bool {
        self.has_role(Role::Moderator) || self.is_admin()
    }
}
