//! `AuthUser` extractor: resolves the bearer token into an identity.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use filestore_auth::{Authentication, ResolvedIdentity};
use filestore_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller available in handlers.
///
/// Requests without bearer credentials are rejected with 401, as are tokens
/// that fail verification or name an unknown or disabled account.
#[derive(Debug, Clone)]
pub struct AuthUser(pub ResolvedIdentity);

impl AuthUser {
    /// Returns the inner identity.
    pub fn identity(&self) -> &ResolvedIdentity {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = ResolvedIdentity;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        match state.authenticator.authenticate(header).await? {
            Authentication::Authenticated(identity) => Ok(AuthUser(identity)),
            Authentication::Anonymous => {
                Err(AppError::unauthorized("Authentication required").into())
            }
        }
    }
}
