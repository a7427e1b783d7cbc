//! Argon2id password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use std::sync::OnceLock;

use filestore_core::error::AppError;

/// Hash checked when the account does not exist, so an unknown username
/// costs the same Argon2 work as a wrong password.
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Handles password hashing and verification using Argon2id.
///
/// Both operations are CPU-bound; callers run them on the persistence pool.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a new password hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored Argon2id hash.
    ///
    /// Returns `Ok(true)` if the password matches, `Ok(false)` if not.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        let argon2 = Argon2::default();
        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

impl PasswordHasher {
    /// Runs a full verification against a fixed hash and always reports a
    /// mismatch. Used on the unknown-user path of a login.
    pub fn verify_dummy(&self, password: &str) -> Result<bool, AppError> {
        let hash = match DUMMY_HASH.get() {
            Some(hash) => hash,
            None => {
                let hash = self.hash_password("filestore-unknown-account")?;
                DUMMY_HASH.get_or_init(|| hash)
            }
        };
        self.verify_password(password, hash)?;
        Ok(false)
    }
}
