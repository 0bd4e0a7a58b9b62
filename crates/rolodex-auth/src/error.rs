//! Error type for `rolodex-auth`.

use thiserror::Error;

pub const NOT_AUTHENTICATED: &str = "Not authenticated";
pub const INVALID_CREDENTIALS: &str = "Could not validate credentials";

#[derive(Debug, Error)]
pub enum AuthError {
  /// The caller's identity could not be established. Carries the
  /// user-facing message.
  #[error("{0}")]
  Unauthenticated(&'static str),

  #[error("Allowed only for Admin")]
  Forbidden,

  /// Bad signature, malformed structure, or expired. Deliberately not split.
  #[error("invalid token")]
  InvalidToken,

  #[error("token signing failed: {0}")]
  Signing(String),

  #[error("password hashing failed: {0}")]
  Hashing(String),

  #[error("cache error: {0}")]
  Cache(String),

  #[error(transparent)]
  Directory(#[from] rolodex_core::Error),
}
