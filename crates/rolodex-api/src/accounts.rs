//! Account flows: registration, login, email confirmation, password reset,
//! avatar update.
//!
//! Handlers stay thin and call in here. Every flow returns [`ApiError`] with
//! the user-facing message already chosen.

use std::collections::BTreeMap;

use rolodex_auth::password::{self, DECOY_HASH};
use rolodex_core::{
  outbound::{MailMessage, MailTemplate},
  store::UserDirectory,
  user::{NewUser, User, UserField, validate_registration},
};
use serde::Deserialize;

use crate::{ApiError, AppState, Backend, mailer, media::gravatar_url};

pub const INCORRECT_LOGIN: &str = "Incorrect login or password";
pub const EMAIL_NOT_CONFIRMED: &str = "Email address not confirmed";
pub const EMAIL_TAKEN: &str = UserField::Email.conflict_message();
pub const USERNAME_TAKEN: &str = UserField::Username.conflict_message();
pub const VERIFICATION_ERROR: &str = "Verification error";
pub const CHECK_EMAIL: &str = "Check your email for confirmation.";
pub const ALREADY_CONFIRMED: &str = "Your email has already been confirmed.";
pub const EMAIL_CONFIRMED: &str = "Email confirmed";

pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 72;

/// Prefix of every avatar's media public id.
pub const AVATAR_FOLDER: &str = "Rolodex";

#[derive(Debug, Deserialize)]
pub struct Registration {
  pub username: String,
  pub email:    String,
  pub password: String,
}

// ─── Registration & login ─────────────────────────────────────────────────────

/// Create an unconfirmed account and mail a confirmation link.
///
/// Email is checked before username, so a request colliding on both reports
/// the email.
pub async fn register<S: Backend>(
  state: &AppState<S>,
  input: Registration,
) -> Result<User, ApiError> {
  validate_registration(&input.username, &input.email)?;

  if state
    .store
    .get_user_by_email(&input.email)
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
  }
  if state
    .store
    .get_user_by_username(&input.username)
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(ApiError::Conflict(USERNAME_TAKEN.to_string()));
  }

  let password_hash = password::hash_password(input.password).await?;
  let user = state
    .store
    .create_user(NewUser {
      avatar: Some(gravatar_url(&input.email)),
      username: input.username,
      email: input.email,
      password_hash,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(username = %user.username, "registered user");
  send_action_mail(state, MailTemplate::VerifyEmail, &user);
  Ok(user)
}

/// Exchange credentials for a session token.
///
/// An unknown username and a wrong password fail identically, and both run a
/// full hash verification.
pub async fn login<S: Backend>(
  state: &AppState<S>,
  username: &str,
  password: String,
) -> Result<String, ApiError> {
  let user = state
    .store
    .get_user_by_username(username)
    .await
    .map_err(ApiError::store)?;

  let hash = user
    .as_ref()
    .map_or_else(|| DECOY_HASH.to_string(), |u| u.password_hash.clone());
  let matches = password::verify_password(password, hash).await?;

  let user = match user {
    Some(user) if matches => user,
    _ => return Err(ApiError::Unauthenticated(INCORRECT_LOGIN.to_string())),
  };
  if !user.confirmed {
    return Err(ApiError::Unauthenticated(EMAIL_NOT_CONFIRMED.to_string()));
  }

  tracing::debug!(%username, "login succeeded");
  Ok(state.auth.tokens().issue_session_token(&user.username)?)
}

// ─── Email confirmation ───────────────────────────────────────────────────────

/// Confirm the address named by an action token. Confirming twice is not an
/// error.
pub async fn confirm_email<S: Backend>(
  state: &AppState<S>,
  token: &str,
) -> Result<&'static str, ApiError> {
  let email = state.auth.tokens().decode_action_subject(token)?;
  let user = state
    .store
    .get_user_by_email(&email)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::BadRequest(VERIFICATION_ERROR.to_string()))?;

  if user.confirmed {
    return Ok(ALREADY_CONFIRMED);
  }
  state
    .store
    .confirm_email(&email)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(username = %user.username, "email confirmed");
  Ok(EMAIL_CONFIRMED)
}

/// Re-send the confirmation link. An unknown address gets the same answer as
/// a known one and nothing is sent.
pub async fn resend_confirmation<S: Backend>(
  state: &AppState<S>,
  email: &str,
) -> Result<&'static str, ApiError> {
  match state
    .store
    .get_user_by_email(email)
    .await
    .map_err(ApiError::store)?
  {
    Some(user) if user.confirmed => Ok(ALREADY_CONFIRMED),
    Some(user) => {
      send_action_mail(state, MailTemplate::VerifyEmail, &user);
      Ok(CHECK_EMAIL)
    }
    None => {
      tracing::debug!(%email, "confirmation requested for unknown address");
      Ok(CHECK_EMAIL)
    }
  }
}

// ─── Password reset ───────────────────────────────────────────────────────────

/// Mail a reset link. Unknown addresses are answered the same way and get
/// nothing.
pub async fn request_password_reset<S: Backend>(
  state: &AppState<S>,
  email: &str,
) -> Result<&'static str, ApiError> {
  match state
    .store
    .get_user_by_email(email)
    .await
    .map_err(ApiError::store)?
  {
    Some(user) => send_action_mail(state, MailTemplate::ResetPassword, &user),
    None => tracing::debug!(%email, "password reset requested for unknown address"),
  }
  Ok(CHECK_EMAIL)
}

pub fn validate_new_password(password: &str) -> Result<(), ApiError> {
  let len = password.chars().count();
  if (PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
    Ok(())
  } else {
    Err(ApiError::Validation(format!(
      "new_password must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"
    )))
  }
}

/// Set a new password for the address named by an action token.
pub async fn reset_password<S: Backend>(
  state: &AppState<S>,
  token: &str,
  new_password: String,
) -> Result<User, ApiError> {
  validate_new_password(&new_password)?;

  let email = state.auth.tokens().decode_action_subject(token)?;
  if state
    .store
    .get_user_by_email(&email)
    .await
    .map_err(ApiError::store)?
    .is_none()
  {
    return Err(ApiError::BadRequest(VERIFICATION_ERROR.to_string()));
  }

  let hash = password::hash_password(new_password).await?;
  let user = state
    .store
    .set_password_hash(&email, &hash)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(username = %user.username, "password reset");
  refresh_session(state, &user).await;
  Ok(user)
}

// ─── Avatar ───────────────────────────────────────────────────────────────────

/// Upload a new avatar for `user` and store its derived 250×250 URL.
pub async fn update_avatar<S: Backend>(
  state: &AppState<S>,
  user: &User,
  bytes: Vec<u8>,
) -> Result<User, ApiError> {
  let public_id = format!("{AVATAR_FOLDER}/{}", user.username);
  let uploaded = state
    .media
    .upload(bytes, &public_id)
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;
  let url = state.media.avatar_url(&public_id, uploaded.version);

  let updated = state
    .store
    .set_avatar(&user.email, &url)
    .await
    .map_err(ApiError::store)?;
  refresh_session(state, &updated).await;
  Ok(updated)
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Issue an action token for `user.email` and hand the mail to the background
/// dispatcher.
fn send_action_mail<S: Backend>(
  state: &AppState<S>,
  template: MailTemplate,
  user: &User,
) {
  let token = match state.auth.tokens().issue_action_token(&user.email) {
    Ok(token) => token,
    Err(e) => {
      tracing::warn!(error = %e, template = template.name(), "could not issue action token");
      return;
    }
  };

  let variables = BTreeMap::from([
    ("host".to_string(), state.config.base_url.clone()),
    ("username".to_string(), user.username.clone()),
    ("token".to_string(), token),
  ]);
  mailer::dispatch(
    state.mailer.clone(),
    MailMessage { template, recipient: user.email.clone(), variables },
  );
}

/// Replace the cached snapshot after a write the caller will see next.
async fn refresh_session<S: Backend>(state: &AppState<S>, user: &User) {
  if let Err(e) = state.auth.sessions().put(user).await {
    tracing::warn!(username = %user.username, error = %e, "session cache refresh failed");
  }
}
