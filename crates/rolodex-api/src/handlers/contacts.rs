//! Handlers for `/contacts` endpoints. Every operation is scoped to the
//! bearer's own contacts; someone else's contact is simply not found.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/contacts` | `?skip&limit` |
//! | `POST`   | `/contacts` | 201; 409 on duplicate email or phone |
//! | `GET`    | `/contacts/search` | `?query&skip&limit`, query ≥ 3 chars |
//! | `GET`    | `/contacts/birthdays` | next seven days, today included |
//! | `GET`    | `/contacts/{id}` | |
//! | `PUT`    | `/contacts/{id}` | partial update |
//! | `DELETE` | `/contacts/{id}` | returns the removed contact |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use rolodex_core::{
  contact::{Contact, ContactPatch, NewContact},
  store::ContactStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiError, AppState, Backend, extract::CurrentUser};

pub const CONTACT_NOT_FOUND: &str = "Contact not found";

/// Largest page a caller may request.
pub const MAX_PAGE: usize = 100;

pub const SEARCH_MIN_LEN: usize = 3;

fn default_limit() -> usize { MAX_PAGE }

fn not_found() -> ApiError { ApiError::NotFound(CONTACT_NOT_FOUND.to_string()) }

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct Page {
  #[serde(default)]
  pub skip:  usize,
  #[serde(default = "default_limit")]
  pub limit: usize,
}

/// `GET /contacts[?skip&limit]`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(page): Query<Page>,
) -> Result<Json<Vec<Contact>>, ApiError> {
  let contacts = state
    .store
    .list_contacts(user.user_id, page.skip, page.limit.min(MAX_PAGE))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(contacts))
}

// ─── Search ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub query: String,
  #[serde(default)]
  pub skip:  usize,
  #[serde(default = "default_limit")]
  pub limit: usize,
}

/// `GET /contacts/search?query=<text>[&skip&limit]`
pub async fn search<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Contact>>, ApiError> {
  if params.query.chars().count() < SEARCH_MIN_LEN {
    return Err(ApiError::Validation(format!(
      "query must be at least {SEARCH_MIN_LEN} characters"
    )));
  }
  let contacts = state
    .store
    .search_contacts(
      user.user_id,
      &params.query,
      params.skip,
      params.limit.min(MAX_PAGE),
    )
    .await
    .map_err(ApiError::store)?;
  Ok(Json(contacts))
}

// ─── Birthdays ────────────────────────────────────────────────────────────────

/// `GET /contacts/birthdays`
pub async fn birthdays<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Contact>>, ApiError> {
  let today = Utc::now().date_naive();
  let contacts = state
    .store
    .upcoming_birthdays(user.user_id, today)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(contacts))
}

// ─── Single contact ───────────────────────────────────────────────────────────

/// `GET /contacts/{id}`
pub async fn get_one<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError> {
  let contact = state
    .store
    .get_contact(user.user_id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  Ok(Json(contact))
}

/// `POST /contacts`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<NewContact>,
) -> Result<impl IntoResponse, ApiError> {
  body.validate()?;
  let contact = state
    .store
    .create_contact(user.user_id, body)
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(owner = %user.user_id, contact = %contact.contact_id, "contact created");
  Ok((StatusCode::CREATED, Json(contact)))
}

/// `PUT /contacts/{id}`: only the supplied fields change.
pub async fn update<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<ContactPatch>,
) -> Result<Json<Contact>, ApiError> {
  patch.validate()?;
  let result = if patch.is_empty() {
    state.store.get_contact(user.user_id, id).await
  } else {
    state.store.update_contact(user.user_id, id, patch).await
  };
  let contact = result.map_err(ApiError::store)?.ok_or_else(not_found)?;
  Ok(Json(contact))
}

/// `DELETE /contacts/{id}`
pub async fn remove<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError> {
  let contact = state
    .store
    .delete_contact(user.user_id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  Ok(Json(contact))
}
