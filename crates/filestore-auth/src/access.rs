//! Access policy: a pure decision over actor, resource owner and operation.
//!
//! No I/O happens here. Services call [`enforce`] before touching any
//! resource when the operation does not depend on an owner, and after
//! loading the resource when it does.

use uuid::Uuid;

use filestore_core::error::AppError;

use crate::identity::ResolvedIdentity;

/// Operations the policy knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Any authenticated action without an owner check (upload, profile, fetch by id).
    Authenticated,
    /// Listing files or events.
    ListMany,
    /// Rename, delete or download a specific file.
    Mutate,
    /// Reading the user directory.
    BrowseUsers,
    /// Creating, re-roling, disabling or deleting users.
    Administer,
}

/// Visibility granted to a listing or access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Unrestricted.
    All,
    /// Narrowed to resources owned by this user.
    OwnedBy(Uuid),
}

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No identity.
    Unauthenticated,
    /// Identity lacks the required authority or ownership.
    Forbidden,
}

/// Policy outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(Scope),
    Deny(Denial),
}

/// Decide whether `actor` may perform `op` on a resource owned by `owner`.
pub fn authorize(actor: Option<&ResolvedIdentity>, owner: Option<Uuid>, op: Operation) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny(Denial::Unauthenticated);
    };

    match op {
        Operation::Authenticated => Decision::Allow(Scope::All),
        Operation::ListMany if actor.is_privileged() => Decision::Allow(Scope::All),
        Operation::ListMany => Decision::Allow(Scope::OwnedBy(actor.id())),
        Operation::Mutate if actor.is_privileged() => Decision::Allow(Scope::All),
        Operation::Mutate if owner == Some(actor.id()) => Decision::Allow(Scope::OwnedBy(actor.id())),
        Operation::Mutate => Decision::Deny(Denial::Forbidden),
        Operation::BrowseUsers if actor.is_privileged() => Decision::Allow(Scope::All),
        Operation::Administer if actor.is_admin() => Decision::Allow(Scope::All),
        Operation::BrowseUsers | Operation::Administer => Decision::Deny(Denial::Forbidden),
    }
}

/// [`authorize`], with denials turned into errors.
pub fn enforce(
    actor: Option<&ResolvedIdentity>,
    owner: Option<Uuid>,
    op: Operation,
) -> Result<Scope, AppError> {
    match authorize(actor, owner, op) {
        Decision::Allow(scope) => Ok(scope),
        Decision::Deny(Denial::Unauthenticated) => {
            Err(AppError::unauthorized("Authentication required"))
        }
        Decision::Deny(Denial::Forbidden) => Err(AppError::forbidden(match op {
            Operation::Mutate => "Not owner",
            Operation::Administer => "Admin role required",
            _ => "Moderator or admin role required",
        })),
    }
}
