//! Handlers for `/users` endpoints.

use axum::{
  Json,
  extract::{Multipart, State},
};

use super::UserProfile;
use crate::{
  ApiError, AppState, Backend, accounts,
  extract::{AdminUser, CurrentUser},
};

/// `GET /users/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
  Json(user.into())
}

/// `PATCH /users/avatar`: multipart body with a `file` part.
///
/// Admin only. Ordinary users cannot change their own avatar.
pub async fn update_avatar<S: Backend>(
  State(state): State<AppState<S>>,
  AdminUser(user): AdminUser,
  mut multipart: Multipart,
) -> Result<Json<UserProfile>, ApiError> {
  let mut file = None;
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(e.body_text()))?
  {
    if field.name() == Some("file") {
      let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
      file = Some(bytes.to_vec());
      break;
    }
  }

  let bytes = file.ok_or_else(|| ApiError::Validation("missing file part".to_string()))?;
  let user = accounts::update_avatar(&state, &user, bytes).await?;
  Ok(Json(user.into()))
}
