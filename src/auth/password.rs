//! Password hashing
//!
//! Argon2id with a random per-hash salt, stored as a PHC string.
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};

use crate::error::AppError;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hash a plaintext password
pub async fn hash_password(plaintext: &str) -> Result<String, AppError> {
    let plaintext = plaintext.to_owned();

    tokio::task::spawn_blocking(move || -> Result<String, anyhow::Error> {
        let salt = SaltString::generate(&mut rand::rngs::OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
        Ok(hash.to_string())
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?
    .map_err(AppError::Internal)
}

/// Check a plaintext password against a stored hash
///
/// A malformed stored hash never verifies.
pub async fn verify_password(plaintext: &str, stored_hash: &str) -> Result<bool, AppError> {
    let plaintext = plaintext.to_owned();
    let stored_hash = stored_hash.to_owned();

    tokio::task::spawn_blocking(move || {
        let hash = match PasswordHash::new(&stored_hash) {
            Ok(hash) => hash,
            Err(err) => {
                tracing::error!("failed to parse password hash: {}", err);
                return false;
            }
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &hash)
            .is_ok()
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))
}

/// Whether a candidate password is long enough
pub fn is_strong_enough(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}
