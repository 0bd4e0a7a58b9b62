//! Bearer-token extractors.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use rolodex_auth::require_admin;
use rolodex_core::user::User;

use crate::{ApiError, AppState, Backend};

/// The authenticated caller.
pub struct CurrentUser(pub User);

/// The authenticated caller, who is an admin.
pub struct AdminUser(pub User);

/// The token from `Authorization: Bearer <token>`. The scheme is matched
/// case-insensitively; anything else counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.split_once(' ')?;
  let token = token.trim();
  (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl<S: Backend> FromRequestParts<AppState<S>> for CurrentUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let user = state.auth.resolve(bearer_token(&parts.headers)).await?;
    Ok(CurrentUser(user))
  }
}

impl<S: Backend> FromRequestParts<AppState<S>> for AdminUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
    require_admin(&user)?;
    Ok(AdminUser(user))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  fn headers(value: &'static str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
    h
  }

  #[test]
  fn parses_bearer_scheme() {
    assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
    assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
  }

  #[test]
  fn rejects_other_schemes_and_empty_tokens() {
    assert_eq!(bearer_token(&HeaderMap::new()), None);
    assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
    assert_eq!(bearer_token(&headers("Bearer ")), None);
    assert_eq!(bearer_token(&headers("Bearer")), None);
  }
}
