//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use rolodex_auth::AuthError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler. The payload is the user-facing
/// message, rendered as `{"detail": …}`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Unauthenticated(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  Validation(String),

  #[error("Rate limit exceeded: {limit} per 1 minute")]
  RateLimited { limit: u32, retry_after: u64 },

  #[error("Error connecting to the database")]
  DatabaseUnreachable,

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  /// Convert any store error through [`rolodex_core::Error`].
  pub fn store<E: Into<rolodex_core::Error>>(e: E) -> Self {
    let core: rolodex_core::Error = e.into();
    core.into()
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
      Self::DatabaseUnreachable | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<rolodex_core::Error> for ApiError {
  fn from(e: rolodex_core::Error) -> Self {
    use rolodex_core::Error as Core;
    match e {
      Core::DuplicateContact(_) | Core::DuplicateUser(_) => {
        Self::Conflict(e.to_string())
      }
      Core::UserNotFound(_) => Self::NotFound("User not found".to_string()),
      Core::Validation(msg) => Self::Validation(msg),
      Core::Serialization(_) | Core::Storage(_) => Self::Internal(e.to_string()),
    }
  }
}

impl From<AuthError> for ApiError {
  fn from(e: AuthError) -> Self {
    match e {
      AuthError::Unauthenticated(msg) => Self::Unauthenticated(msg.to_string()),
      AuthError::Forbidden => Self::Forbidden(e.to_string()),
      AuthError::InvalidToken => {
        Self::BadRequest("Invalid email verification token".to_string())
      }
      AuthError::Directory(core) => core.into(),
      AuthError::Signing(_) | AuthError::Hashing(_) | AuthError::Cache(_) => {
        Self::Internal(e.to_string())
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let detail = match &self {
      Self::Internal(cause) => {
        tracing::error!(%cause, "request failed");
        "Internal server error".to_string()
      }
      other => other.to_string(),
    };

    let mut res = (status, Json(json!({ "detail": detail }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Bearer"),
      );
    }
    if let Self::RateLimited { retry_after, .. } = self {
      res.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    }
    res
  }
}
