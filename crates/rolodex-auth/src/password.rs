//! Argon2 password hashing.
//!
//! Hashing is deliberately slow, so both entry points run on tokio's blocking
//! pool rather than on a runtime worker.

use argon2::{
  Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier as _,
  password_hash::SaltString,
};
use rand_core::OsRng;

use crate::AuthError;

/// A well-formed hash that matches no password. Verifying against it costs
/// the same as a real verification, so a missing account and a wrong
/// password take the same time.
pub const DECOY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$cm9sb2RleGRlY295c2FsdA$veuboir4+nPln+fE08SK4RZWF912xyB3PN9svDOpHdc";

fn hash_blocking(plaintext: &str) -> Result<String, AuthError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(plaintext.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| AuthError::Hashing(e.to_string()))
}

fn verify_blocking(plaintext: &str, hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    tracing::warn!("stored password hash is not a valid PHC string");
    return false;
  };
  Argon2::default()
    .verify_password(plaintext.as_bytes(), &parsed)
    .is_ok()
}

/// Hash `plaintext` with a fresh random salt into a PHC string.
pub async fn hash_password(plaintext: String) -> Result<String, AuthError> {
  tokio::task::spawn_blocking(move || hash_blocking(&plaintext))
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?
}

/// `true` iff `plaintext` matches `hash`. A malformed hash never matches.
pub async fn verify_password(
  plaintext: String,
  hash: String,
) -> Result<bool, AuthError> {
  tokio::task::spawn_blocking(move || verify_blocking(&plaintext, &hash))
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))
}
