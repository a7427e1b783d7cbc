//! Request authentication: bearer token to resolved identity.

use std::sync::Arc;

use tracing::debug;

use filestore_core::error::AppError;
use filestore_core::offload::PersistencePool;
use filestore_database::store::UserStore;

use crate::identity::ResolvedIdentity;
use crate::jwt::TokenService;

/// Scheme prefix of the `Authorization` header value.
const BEARER_PREFIX: &str = "Bearer ";

/// Result of authenticating a request.
#[derive(Debug, Clone)]
pub enum Authentication {
    /// No bearer credentials were presented.
    Anonymous,
    /// A valid token for an existing, enabled account.
    Authenticated(ResolvedIdentity),
}

impl Authentication {
    /// The identity, if any.
    pub fn identity(&self) -> Option<&ResolvedIdentity> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(identity) => Some(identity),
        }
    }
}

/// Converts an `Authorization` header into a [`ResolvedIdentity`].
///
/// Authorities come from the user's roles as stored now, not from the
/// token's role snapshot, so role changes apply on the next request.
#[derive(Debug, Clone)]
pub struct Authenticator {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserStore>,
    pool: PersistencePool,
}

impl Authenticator {
    /// Creates a new authenticator.
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserStore>, pool: PersistencePool) -> Self {
        Self {
            tokens,
            users,
            pool,
        }
    }

    /// Authenticate a raw `Authorization` header value.
    ///
    /// A missing header or a non-bearer scheme yields
    /// [`Authentication::Anonymous`]. A bearer token that fails verification
    /// or names an unknown, mismatched or disabled account is an
    /// `Unauthorized` error.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<Authentication, AppError> {
        let Some(token) = header.and_then(|h| h.strip_prefix(BEARER_PREFIX)) else {
            return Ok(Authentication::Anonymous);
        };

        let claims = self.tokens.verify(token.trim()).map_err(|e| {
            debug!(error = %e, "Bearer token rejected");
            AppError::from(e)
        })?;

        let users = self.users.clone();
        let username = claims.sub.clone();
        let user = self
            .pool
            .run(async move { users.find_by_username(&username).await })
            .await?
            .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

        if user.id != claims.uid {
            return Err(AppError::unauthorized("Token subject does not match account"));
        }
        if !user.can_login() {
            return Err(AppError::unauthorized("Account is disabled"));
        }

        Ok(Authentication::Authenticated(ResolvedIdentity::new(user)))
    }
}
