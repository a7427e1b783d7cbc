//! Registration, login and the caller's own profile.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use filestore_auth::{IssuedToken, PasswordHasher, ResolvedIdentity, TokenService};
use filestore_core::error::AppError;
use filestore_core::offload::PersistencePool;
use filestore_core::result::AppResult;
use filestore_database::store::UserStore;
use filestore_entity::user::{CreateUser, Role, User, UserStatus};

/// A user together with a freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: IssuedToken,
}

/// Handles self-service account operations.
#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
    pool: PersistencePool,
    password_min_length: usize,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<TokenService>,
        pool: PersistencePool,
        password_min_length: usize,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher: PasswordHasher::new(),
            pool,
            password_min_length,
        }
    }

    /// Create an ACTIVE account holding the USER role and sign it in.
    pub async fn register(&self, username: &str, password: &str) -> AppResult<AuthSession> {
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::invalid_input("Username must not be blank"));
        }
        check_password(password, self.password_min_length)?;

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let users = self.users.clone();
        let user = self
            .pool
            .run(async move {
                let password_hash = hasher.hash_password(&password)?;
                users
                    .create(&CreateUser {
                        username,
                        password_hash,
                        status: UserStatus::Active,
                        roles: vec![Role::User],
                    })
                    .await
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        self.issue(user)
    }

    /// Verify credentials and sign the user in.
    ///
    /// Unknown usernames, wrong passwords and disabled accounts all fail
    /// with the same `Unauthorized` error.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<AuthSession> {
        let hasher = self.hasher.clone();
        let users = self.users.clone();
        let username = username.trim().to_string();
        let password = password.to_string();

        let user = self
            .pool
            .run(async move {
                let Some(user) = users.find_by_username(&username).await? else {
                    hasher.verify_dummy(&password)?;
                    return Ok(None);
                };
                let valid = hasher.verify_password(&password, &user.password_hash)?;
                Ok((valid && user.can_login()).then_some(user))
            })
            .await?;

        match user {
            Some(user) => {
                info!(user_id = %user.id, "User logged in");
                self.issue(user)
            }
            None => {
                debug!("Login rejected");
                Err(AppError::unauthorized("Bad credentials"))
            }
        }
    }

    /// The authenticated caller's account, as loaded for this request.
    pub fn me(&self, actor: &ResolvedIdentity) -> User {
        actor.user().clone()
    }

    fn issue(&self, user: User) -> AppResult<AuthSession> {
        let mut extra = Map::new();
        extra.insert("status".to_string(), Value::String(user.status.to_string()));
        let token = self
            .tokens
            .issue(user.id, &user.username, &user.role_names(), extra)?;
        Ok(AuthSession { user, token })
    }
}

/// Reject passwords shorter than the configured minimum.
pub(crate) fn check_password(password: &str, min_length: usize) -> AppResult<()> {
    if password.chars().count() < min_length {
        return Err(AppError::invalid_input(format!(
            "Password must be at least {min_length} characters"
        )));
    }
    Ok(())
}
