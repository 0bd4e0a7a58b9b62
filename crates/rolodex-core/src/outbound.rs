//! Ports to external collaborators: key-value cache, mailer, media host.
//!
//! These are object-safe so the application can hold them as
//! `Arc<dyn …>` and swap in fakes under test.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

/// A failure reported by an outbound collaborator.
#[derive(Debug, Error)]
#[error("{service}: {message}")]
pub struct OutboundError {
  pub service: &'static str,
  pub message: String,
}

impl OutboundError {
  pub fn new(service: &'static str, message: impl Into<String>) -> Self {
    Self { service, message: message.into() }
  }
}

// ─── Key-value cache ─────────────────────────────────────────────────────────

/// String-keyed cache with per-entry expiry. Each call is atomic on its own;
/// there are no multi-key transactions.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
  async fn get(&self, key: &str) -> Result<Option<String>, OutboundError>;

  async fn set(
    &self,
    key: &str,
    value: String,
    ttl: Duration,
  ) -> Result<(), OutboundError>;

  async fn delete(&self, key: &str) -> Result<(), OutboundError>;
}

// ─── Mail ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTemplate {
  VerifyEmail,
  ResetPassword,
}

impl MailTemplate {
  pub fn subject(self) -> &'static str {
    match self {
      Self::VerifyEmail => "Confirm your email",
      Self::ResetPassword => "Password reset",
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::VerifyEmail => "verify_email",
      Self::ResetPassword => "reset_password",
    }
  }
}

#[derive(Debug, Clone)]
pub struct MailMessage {
  pub template:  MailTemplate,
  pub recipient: String,
  /// Template variables: `host`, `username`, `token`.
  pub variables: BTreeMap<String, String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, message: MailMessage) -> Result<(), OutboundError>;
}

// ─── Media ───────────────────────────────────────────────────────────────────

/// Side length, in pixels, of the square derived avatar image.
pub const AVATAR_SIZE: u32 = 250;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
  pub url:     String,
  pub version: u64,
}

#[async_trait]
pub trait MediaHost: Send + Sync {
  /// Store `bytes` under `public_id`, overwriting any previous upload.
  async fn upload(
    &self,
    bytes: Vec<u8>,
    public_id: &str,
  ) -> Result<UploadedMedia, OutboundError>;

  /// URL at which the avatar for an upload is served. Image CDNs return a
  /// fixed-size, fill-cropped rendition (see [`fill_crop_url`]); hosts that
  /// cannot resize serve the original.
  fn avatar_url(&self, public_id: &str, version: u64) -> String;
}

/// Build a derived-image URL in the `c_fill,h_…,w_…/v…/id` form used by
/// common image CDNs.
pub fn fill_crop_url(base: &str, public_id: &str, version: u64) -> String {
  format!(
    "{}/c_fill,h_{size},w_{size}/v{version}/{public_id}",
    base.trim_end_matches('/'),
    size = AVATAR_SIZE,
  )
}
