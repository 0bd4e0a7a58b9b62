//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | JSON `{username, email, password}`; 201 |
//! | `POST` | `/auth/login` | Form `username`, `password` |
//! | `GET`  | `/auth/confirmed_email/{token}` | |
//! | `POST` | `/auth/request_email` | JSON `{email}` |
//! | `POST` | `/auth/request_password_reset` | JSON `{email}` |
//! | `POST` | `/auth/password_reset/{token}` | JSON `{new_password}` |

use axum::{
  Form, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use super::{Message, UserProfile};
use crate::{
  ApiError, AppState, Backend,
  accounts::{self, Registration},
};

/// `POST /auth/register`
pub async fn register<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<Registration>,
) -> Result<impl IntoResponse, ApiError> {
  let user = accounts::register(&state, body).await?;
  Ok((StatusCode::CREATED, Json(UserProfile::from(user))))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub token_type:   &'static str,
}

/// `POST /auth/login`
pub async fn login<S: Backend>(
  State(state): State<AppState<S>>,
  Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
  let access_token = accounts::login(&state, &form.username, form.password).await?;
  Ok(Json(TokenResponse { access_token, token_type: "bearer" }))
}

/// `GET /auth/confirmed_email/{token}`
pub async fn confirmed_email<S: Backend>(
  State(state): State<AppState<S>>,
  Path(token): Path<String>,
) -> Result<Json<Message>, ApiError> {
  let message = accounts::confirm_email(&state, &token).await?;
  Ok(Json(Message { message }))
}

#[derive(Debug, Deserialize)]
pub struct EmailBody {
  pub email: String,
}

/// `POST /auth/request_email`
pub async fn request_email<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<EmailBody>,
) -> Result<Json<Message>, ApiError> {
  let message = accounts::resend_confirmation(&state, &body.email).await?;
  Ok(Json(Message { message }))
}

/// `POST /auth/request_password_reset`
pub async fn request_password_reset<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<EmailBody>,
) -> Result<Json<Message>, ApiError> {
  let message = accounts::request_password_reset(&state, &body.email).await?;
  Ok(Json(Message { message }))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetBody {
  pub new_password: String,
}

/// `POST /auth/password_reset/{token}`
pub async fn password_reset<S: Backend>(
  State(state): State<AppState<S>>,
  Path(token): Path<String>,
  Json(body): Json<PasswordResetBody>,
) -> Result<Json<UserProfile>, ApiError> {
  let user = accounts::reset_password(&state, &token, body.new_password).await?;
  Ok(Json(user.into()))
}
