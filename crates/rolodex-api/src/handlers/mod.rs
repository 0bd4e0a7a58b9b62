//! axum handlers, one module per route group.

pub mod auth;
pub mod contacts;
pub mod health;
pub mod users;

use chrono::{DateTime, Utc};
use rolodex_core::user::{Role, User};
use serde::Serialize;
use uuid::Uuid;

/// Public view of a [`User`]. Never includes the password hash.
#[derive(Debug, Serialize)]
pub struct UserProfile {
  pub id:         Uuid,
  pub username:   String,
  pub email:      String,
  pub avatar:     Option<String>,
  pub confirmed:  bool,
  pub created_at: DateTime<Utc>,
  pub role:       Role,
}

impl From<User> for UserProfile {
  fn from(u: User) -> Self {
    Self {
      id:         u.user_id,
      username:   u.username,
      email:      u.email,
      avatar:     u.avatar,
      confirmed:  u.confirmed,
      created_at: u.created_at,
      role:       u.role,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct Message {
  pub message: &'static str,
}
