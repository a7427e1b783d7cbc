//! Token verification failures.

use thiserror::Error;

use filestore_core::error::AppError;

/// Why a token failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Malformed, wrongly signed, or otherwise unacceptable.
    #[error("Invalid token")]
    InvalidToken,
    /// The expiry instant has passed.
    #[error("Token has expired")]
    ExpiredToken,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::unauthorized(err.to_string())
    }
}
