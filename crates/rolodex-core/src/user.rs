//! User records: identity and credentials.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const USERNAME_MAX_LEN: usize = 20;
pub const USER_EMAIL_MAX_LEN: usize = 50;

/// Authorisation role. Exactly two exist.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  User,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Admin => "admin",
    }
  }
}

/// A persisted user. `password_hash` is a PHC string, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  /// Flips to `true` once; there is no way back.
  pub confirmed:     bool,
  pub avatar:        Option<String>,
  pub role:          Role,
  pub created_at:    DateTime<Utc>,
}

impl User {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// Input to [`crate::store::UserDirectory::create_user`].
/// The password must already be hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub avatar:        Option<String>,
}

/// The globally unique user columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
  Email,
  Username,
}

impl UserField {
  /// The message shown when registration collides on this field.
  pub const fn conflict_message(self) -> &'static str {
    match self {
      Self::Email => "User with this email already exists.",
      Self::Username => "User with that name already exists.",
    }
  }
}

impl fmt::Display for UserField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Email => "email",
      Self::Username => "username",
    })
  }
}

/// Check registration fields against the column limits.
pub fn validate_registration(username: &str, email: &str) -> Result<()> {
  if username.trim().is_empty() {
    return Err(Error::Validation("username must not be empty".into()));
  }
  if username.chars().count() > USERNAME_MAX_LEN {
    return Err(Error::Validation(format!(
      "username must be at most {USERNAME_MAX_LEN} characters"
    )));
  }
  validate_email(email, USER_EMAIL_MAX_LEN)
}

/// Minimal structural email check; delivery is the real test.
pub fn validate_email(email: &str, max_len: usize) -> Result<()> {
  if email.chars().count() > max_len {
    return Err(Error::Validation(format!(
      "email must be at most {max_len} characters"
    )));
  }
  let valid = email
    .split_once('@')
    .is_some_and(|(local, domain)| {
      !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        && !domain.ends_with('.') && !email.contains(char::is_whitespace)
    });
  if valid {
    Ok(())
  } else {
    Err(Error::Validation(format!("invalid email address: {email:?}")))
  }
}
