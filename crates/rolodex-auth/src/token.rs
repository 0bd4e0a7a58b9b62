//! HS256 session and action tokens.
//!
//! Tokens are stateless. Nothing is revoked server-side; a token stays valid
//! until its `exp`.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Lifetime of a confirmation or password-reset token.
pub const ACTION_TOKEN_TTL: TimeDelta = TimeDelta::minutes(20);

/// Which flow a token was minted for. A token of one kind is never accepted
/// where the other is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
  /// Bearer token; `sub` is a username.
  Session,
  /// Email confirmation or password reset link; `sub` is an email address.
  Action,
}

/// Claim set shared by both token kinds. Action tokens carry `iat`, session
/// tokens do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  #[serde(default)]
  pub sub:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub iat:  Option<i64>,
  pub exp:  i64,
  #[serde(rename = "type", default)]
  pub kind: Option<TokenKind>,
}

#[derive(Clone)]
pub struct TokenService {
  encoding:    EncodingKey,
  decoding:    DecodingKey,
  validation:  Validation,
  session_ttl: TimeDelta,
}

impl TokenService {
  pub fn new(secret: &[u8], session_ttl: Duration) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation,
      session_ttl: TimeDelta::from_std(session_ttl).unwrap_or(TimeDelta::MAX),
    }
  }

  /// Issue a bearer token for `subject` with the configured session lifetime.
  pub fn issue_session_token(&self, subject: &str) -> Result<String, AuthError> {
    self.issue_session_token_for(subject, self.session_ttl)
  }

  pub fn issue_session_token_for(
    &self,
    subject: &str,
    ttl: TimeDelta,
  ) -> Result<String, AuthError> {
    let exp = Utc::now()
      .checked_add_signed(ttl)
      .unwrap_or(DateTime::<Utc>::MAX_UTC);
    self.sign(&Claims {
      sub:  Some(subject.to_owned()),
      iat:  None,
      exp:  exp.timestamp(),
      kind: Some(TokenKind::Session),
    })
  }

  /// Issue a short-lived token for an out-of-band email link.
  pub fn issue_action_token(&self, subject: &str) -> Result<String, AuthError> {
    let now = Utc::now();
    self.sign(&Claims {
      sub:  Some(subject.to_owned()),
      iat:  Some(now.timestamp()),
      exp:  (now + ACTION_TOKEN_TTL).timestamp(),
      kind: Some(TokenKind::Action),
    })
  }

  /// Verify signature and expiry. Every failure is [`AuthError::InvalidToken`].
  pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(token, &self.decoding, &self.validation)
      .map(|data| data.claims)
      .map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        AuthError::InvalidToken
      })
  }

  /// Decode a bearer token and return its username.
  pub fn decode_session_subject(&self, token: &str) -> Result<String, AuthError> {
    self.decode_subject(token, TokenKind::Session)
  }

  /// Decode an action token and return its email address.
  pub fn decode_action_subject(&self, token: &str) -> Result<String, AuthError> {
    self.decode_subject(token, TokenKind::Action)
  }

  /// The token must be of `kind` and carry a non-empty `sub`.
  fn decode_subject(&self, token: &str, kind: TokenKind) -> Result<String, AuthError> {
    let claims = self.decode(token)?;
    if claims.kind != Some(kind) {
      tracing::debug!(expected = ?kind, found = ?claims.kind, "token kind mismatch");
      return Err(AuthError::InvalidToken);
    }
    claims
      .sub
      .filter(|s| !s.is_empty())
      .ok_or(AuthError::InvalidToken)
  }

  fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
    encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
      .map_err(|e| AuthError::Signing(e.to_string()))
  }
}
