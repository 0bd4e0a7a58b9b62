//! Avatar storage and default avatar URLs.

use std::{
  path::{Component, Path, PathBuf},
  time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use rolodex_core::outbound::{MediaHost, OutboundError, UploadedMedia};
use sha2::{Digest, Sha256};

/// Gravatar image for `email`, used until the user uploads an avatar.
pub fn gravatar_url(email: &str) -> String {
  let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
  format!("https://www.gravatar.com/avatar/{}", hex::encode(digest))
}

/// A [`MediaHost`] that stores uploads under a local directory.
///
/// Files land at `<root>/<public_id>`; the upload version is the Unix time in
/// seconds at which it was written. The router serves `<root>` under
/// `/media`, so `base_url` should be `<public origin>/media`. Images are served
/// as uploaded, not resized; the version rides along as `?v=` to bust caches.
pub struct DiskMediaHost {
  root:     PathBuf,
  base_url: String,
}

impl DiskMediaHost {
  pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
    Self { root: root.into(), base_url: base_url.into() }
  }

  fn path_for(&self, public_id: &str) -> Result<PathBuf, OutboundError> {
    let relative = Path::new(public_id);
    let safe = !public_id.is_empty()
      && relative.components().all(|c| matches!(c, Component::Normal(_)));
    if !safe {
      return Err(OutboundError::new(
        "disk-media",
        format!("refusing public id {public_id:?}"),
      ));
    }
    Ok(self.root.join(relative))
  }
}

#[async_trait]
impl MediaHost for DiskMediaHost {
  async fn upload(
    &self,
    bytes: Vec<u8>,
    public_id: &str,
  ) -> Result<UploadedMedia, OutboundError> {
    let path = self.path_for(public_id)?;
    let io_err = |e: std::io::Error| OutboundError::new("disk-media", e.to_string());

    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(&path, &bytes).await.map_err(io_err)?;

    let version = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_secs())
      .unwrap_or_default();
    tracing::debug!(?path, size = bytes.len(), version, "stored upload");

    Ok(UploadedMedia { url: self.avatar_url(public_id, version), version })
  }

  fn avatar_url(&self, public_id: &str, version: u64) -> String {
    format!("{}/{public_id}?v={version}", self.base_url.trim_end_matches('/'))
  }
}
