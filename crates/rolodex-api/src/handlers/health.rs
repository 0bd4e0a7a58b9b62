//! `GET /healthchecker`: round-trips a trivial query through the store.

use axum::{Json, extract::State};
use rolodex_core::store::Health;

use super::Message;
use crate::{ApiError, AppState, Backend};

pub const HEALTHY: &str = "Welcome to Rolodex!";

pub async fn healthchecker<S: Backend>(
  State(state): State<AppState<S>>,
) -> Result<Json<Message>, ApiError> {
  state.store.ping().await.map_err(|e| {
    let cause: rolodex_core::Error = e.into();
    tracing::error!(error = %cause, "health check failed");
    ApiError::DatabaseUnreachable
  })?;
  Ok(Json(Message { message: HEALTHY }))
}
