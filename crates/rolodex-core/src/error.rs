//! Error types for `rolodex-core`.

use thiserror::Error;

use crate::{contact::ContactField, user::UserField};

#[derive(Debug, Error)]
pub enum Error {
  /// A per-owner unique constraint on a contact was violated.
  #[error("Contact with this {0} already exists.")]
  DuplicateContact(ContactField),

  /// A global unique constraint on a user was violated.
  #[error("{}", .0.conflict_message())]
  DuplicateUser(UserField),

  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("{0}")]
  Validation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Any other backend failure. Never retried.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn is_conflict(&self) -> bool {
    matches!(self, Self::DuplicateContact(_) | Self::DuplicateUser(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
