//! Token issuance and verification (HMAC-SHA256).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use filestore_core::config::MIN_SECRET_BYTES;
use filestore_core::config::auth::AuthConfig;
use filestore_core::error::{AppError, ErrorKind};

use super::claims::{Claims, RESERVED_CLAIMS};
use super::error::TokenError;

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWS string.
    pub token: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Configured lifetime in seconds.
    pub expires_in_seconds: i64,
}

#[derive(Clone, Deserialize)]
struct ExpiryOnly {
    exp: i64,
}

/// Issues and verifies signed, time-bounded bearer tokens.
///
/// Stateless given the secret and TTL.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_minutes", &self.ttl.num_minutes())
            .finish()
    }
}

impl TokenService {
    /// Creates a token service. The secret must be at least 32 bytes.
    pub fn new(secret: &str, ttl_minutes: u64) -> Result<Self, AppError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(AppError::configuration(format!(
                "Token signing secret must be at least {MIN_SECRET_BYTES} bytes"
            )));
        }
        let ttl_minutes = i64::try_from(ttl_minutes).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Token TTL out of range", e)
        })?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::minutes(ttl_minutes),
        })
    }

    /// Creates a token service from auth configuration.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        Self::new(&config.jwt_secret, config.jwt_ttl_minutes)
    }

    /// Token lifetime in seconds.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issues a token for the given identity, valid from now.
    pub fn issue(
        &self,
        user_id: Uuid,
        username: &str,
        roles: &[String],
        extra: Map<String, Value>,
    ) -> Result<IssuedToken, AppError> {
        self.issue_at(user_id, username, roles, extra, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        user_id: Uuid,
        username: &str,
        roles: &[String],
        mut extra: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        for reserved in RESERVED_CLAIMS {
            extra.remove(reserved);
        }
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: username.to_string(),
            uid: user_id,
            roles: roles.to_vec(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            extra,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to sign token", e))?;

        Ok(IssuedToken {
            token,
            expires_at,
            expires_in_seconds: self.ttl_seconds(),
        })
    }

    /// Verifies a token and returns its claims.
    ///
    /// Expiry is checked before the signature, so an expired token is
    /// reported as [`TokenError::ExpiredToken`] whether or not its signature
    /// is valid.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies a token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        // Read `exp` without checking the signature yet.
        let unverified = jsonwebtoken::dangerous::insecure_decode::<ExpiryOnly>(token)
            .map_err(|_| TokenError::InvalidToken)?;
        if now.timestamp() >= unverified.claims.exp {
            return Err(TokenError::ExpiredToken);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::ExpiredToken,
                _ => TokenError::InvalidToken,
            })
    }
}
