//! Admin user management: create, re-role, enable/disable, delete.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use filestore_auth::{Operation, PasswordHasher, ResolvedIdentity, enforce};
use filestore_core::error::AppError;
use filestore_core::offload::PersistencePool;
use filestore_core::result::AppResult;
use filestore_database::store::{UserDeletion, UserStore};
use filestore_entity::user::role::resolve_roles;
use filestore_entity::user::{CreateUser, Role, User, UserStatus};

use super::service::check_password;

/// Account data for admin-driven creation.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    /// Role names; empty means `[USER]`.
    pub roles: Vec<String>,
    /// Status name; absent or blank means `ACTIVE`.
    pub status: Option<String>,
}

/// Parse an optional status name, falling back to `default` when blank.
fn parse_status_or(raw: Option<&str>, default: UserStatus) -> AppResult<UserStatus> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse(),
        None => Ok(default),
    }
}

/// Handles administrative user management operations.
#[derive(Debug, Clone)]
pub struct AdminUserService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    pool: PersistencePool,
    password_min_length: usize,
}

impl AdminUserService {
    /// Creates a new admin user service.
    pub fn new(users: Arc<dyn UserStore>, pool: PersistencePool, password_min_length: usize) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(),
            pool,
            password_min_length,
        }
    }

    /// All users, for moderators and admins.
    pub async fn list(&self, actor: &ResolvedIdentity) -> AppResult<Vec<User>> {
        enforce(Some(actor), None, Operation::BrowseUsers)?;
        let users = self.users.clone();
        self.pool.run(async move { users.list().await }).await
    }

    /// Create an account with explicit roles and status.
    pub async fn create(&self, actor: &ResolvedIdentity, account: NewAccount) -> AppResult<User> {
        enforce(Some(actor), None, Operation::Administer)?;

        let roles = resolve_roles(&account.roles)?;
        let status = parse_status_or(account.status.as_deref(), UserStatus::Active)?;
        let user = self
            .insert(account.username, account.password, roles, status)
            .await?;

        info!(actor_id = %actor.id(), user_id = %user.id, "User created by admin");
        Ok(user)
    }

    /// Replace a user's role set.
    pub async fn update_roles(
        &self,
        actor: &ResolvedIdentity,
        id: Uuid,
        roles: &[String],
    ) -> AppResult<User> {
        enforce(Some(actor), None, Operation::Administer)?;
        let roles = resolve_roles(roles)?;

        let users = self.users.clone();
        let user = self
            .pool
            .run(async move { users.set_roles(id, &roles).await })
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        info!(actor_id = %actor.id(), user_id = %id, roles = ?user.role_names(), "User roles updated");
        Ok(user)
    }

    /// Change a user's status. A blank status leaves it unchanged.
    pub async fn update_status(
        &self,
        actor: &ResolvedIdentity,
        id: Uuid,
        status: Option<&str>,
    ) -> AppResult<User> {
        enforce(Some(actor), None, Operation::Administer)?;

        let users = self.users.clone();
        let requested = status.map(str::to_string);
        let user = self
            .pool
            .run(async move {
                let Some(current) = users.find_by_id(id).await? else {
                    return Ok(None);
                };
                let status = parse_status_or(requested.as_deref(), current.status)?;
                if status == current.status {
                    return Ok(Some(current));
                }
                users.set_status(id, status).await
            })
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        info!(actor_id = %actor.id(), user_id = %id, status = %user.status, "User status updated");
        Ok(user)
    }

    /// Delete a user that owns no files and authored no events.
    pub async fn delete(&self, actor: &ResolvedIdentity, id: Uuid) -> AppResult<()> {
        enforce(Some(actor), None, Operation::Administer)?;

        let users = self.users.clone();
        match self
            .pool
            .run(async move { users.delete_if_unreferenced(id).await })
            .await?
        {
            UserDeletion::Deleted => {
                info!(actor_id = %actor.id(), user_id = %id, "User deleted");
                Ok(())
            }
            UserDeletion::NotFound => Err(AppError::not_found("User not found")),
            UserDeletion::Referenced => Err(AppError::conflict("User has files or events")),
        }
    }

    /// Create the configured administrator unless the username is taken.
    ///
    /// Returns the new account, or `None` when it already existed.
    pub async fn ensure_bootstrap_admin(
        &self,
        username: &str,
        password: &str,
    ) -> AppResult<Option<User>> {
        let users = self.users.clone();
        let name = username.to_string();
        let existing = self
            .pool
            .run(async move { users.find_by_username(&name).await })
            .await?;
        if existing.is_some() {
            return Ok(None);
        }

        let user = self
            .insert(
                username.to_string(),
                password.to_string(),
                vec![Role::User, Role::Admin],
                UserStatus::Active,
            )
            .await?;
        info!(user_id = %user.id, username = %user.username, "Bootstrap administrator created");
        Ok(Some(user))
    }

    async fn insert(
        &self,
        username: String,
        password: String,
        roles: Vec<Role>,
        status: UserStatus,
    ) -> AppResult<User> {
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::invalid_input("Username must not be blank"));
        }
        check_password(&password, self.password_min_length)?;

        let hasher = self.hasher.clone();
        let users = self.users.clone();
        self.pool
            .run(async move {
                let password_hash = hasher.hash_password(&password)?;
                users
                    .create(&CreateUser {
                        username,
                        password_hash,
                        status,
                        roles,
                    })
                    .await
            })
            .await
    }
}
