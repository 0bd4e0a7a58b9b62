//! Bearer-token identity resolution.
//!
//! One pass per request:
//!
//! 1. no bearer token → `Not authenticated`
//! 2. token fails to decode, or is not a session token → `Could not validate credentials`
//! 3. no `sub` claim → `Could not validate credentials`
//! 4. session cache hit → that user
//! 5. miss → directory lookup by username, then repopulate the cache
//!
//! Admin-only operations additionally call [`require_admin`]. Email
//! confirmation is not checked here; only login cares about it.

use std::sync::Arc;

use rolodex_core::{store::UserDirectory, user::User};

use crate::{
  AuthError, SessionCache, TokenService,
  error::{INVALID_CREDENTIALS, NOT_AUTHENTICATED},
};

pub struct Authorizer<D> {
  tokens:    TokenService,
  sessions:  SessionCache,
  directory: Arc<D>,
}

impl<D> Clone for Authorizer<D> {
  fn clone(&self) -> Self {
    Self {
      tokens:    self.tokens.clone(),
      sessions:  self.sessions.clone(),
      directory: Arc::clone(&self.directory),
    }
  }
}

impl<D: UserDirectory> Authorizer<D> {
  pub fn new(tokens: TokenService, sessions: SessionCache, directory: Arc<D>) -> Self {
    Self { tokens, sessions, directory }
  }

  pub fn tokens(&self) -> &TokenService { &self.tokens }

  pub fn sessions(&self) -> &SessionCache { &self.sessions }

  /// Resolve the caller behind `bearer`, the raw token without its scheme.
  pub async fn resolve(&self, bearer: Option<&str>) -> Result<User, AuthError> {
    let token = bearer.ok_or(AuthError::Unauthenticated(NOT_AUTHENTICATED))?;

    let username = self
      .tokens
      .decode_session_subject(token)
      .map_err(|_| AuthError::Unauthenticated(INVALID_CREDENTIALS))?;

    if let Some(user) = self.sessions.get(&username).await? {
      tracing::debug!(%username, "session cache hit");
      return Ok(user);
    }

    tracing::debug!(%username, "session cache miss");
    let user = self
      .directory
      .get_user_by_username(&username)
      .await
      .map_err(|e| AuthError::Directory(e.into()))?
      .ok_or(AuthError::Unauthenticated(INVALID_CREDENTIALS))?;

    self.sessions.put(&user).await?;
    Ok(user)
  }
}

/// Reject anyone who is not an admin.
pub fn require_admin(user: &User) -> Result<(), AuthError> {
  if user.is_admin() { Ok(()) } else { Err(AuthError::Forbidden) }
}
