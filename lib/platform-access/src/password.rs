//! Password hashing with Argon2id.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::AuthenticationError;

/// Well-formed Argon2id hash with the default cost parameters that no
/// password matches. Verified against when a login names no account, so
/// unknown emails cost as much as wrong passwords.
const UNMATCHABLE_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$\
     AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hashes `password` with a fresh random salt, returning a PHC string.
///
/// # Errors
///
/// Returns `Entropy` if no salt could be drawn and `Hashing` if Argon2
/// rejects the input.
pub fn hash_password(password: &str) -> Result<String, AuthenticationError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::fill(&mut salt_bytes).map_err(|e| AuthenticationError::Entropy {
        reason: e.to_string(),
    })?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthenticationError::Hashing {
        reason: e.to_string(),
    })?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthenticationError::Hashing {
            reason: e.to_string(),
        })
}

/// Returns true if `password` matches the PHC string `hash`.
///
/// A malformed hash never matches.
#[must_use]
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            false
        }
    }
}

/// Checks `password` against an account's stored hash, if there is one.
///
/// Runs a full Argon2 verification even when `hash` is `None`, then
/// reports no match.
#[must_use]
pub fn verify_stored_password(hash: Option<&str>, password: &str) -> bool {
    match hash {
        Some(hash) => verify_password(hash, password),
        None => {
            let _ = verify_password(UNMATCHABLE_HASH, password);
            false
        }
    }
}
