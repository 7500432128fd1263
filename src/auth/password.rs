//! Credential hashing and verification.
//!
//! Argon2 with per-hash random salts and default work parameters. Hashing
//! is intentionally expensive, so both entry points run on the blocking
//! pool and never stall the async runtime.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use super::types::AuthError;

/// Hash a password (or a session token, which reuses the same primitive so
/// raw tokens never reach the database).
pub(super) async fn hash(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|err| AuthError::Crypto(err.to_string()))?
}

/// Verify a password against a stored hash. Mismatch is `Ok(false)`; a
/// hash that cannot be parsed is a crypto failure, never "no match".
pub(super) async fn verify(password: String, stored: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_blocking(&password, &stored))
        .await
        .map_err(|err| AuthError::Crypto(err.to_string()))?
}

fn hash_blocking(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Crypto(err.to_string()))
}

fn verify_blocking(password: &str, stored: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored).map_err(|err| AuthError::Crypto(err.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(AuthError::Crypto(err.to_string())),
    }
}
