//! Key-value caching of user records.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
  time::{Duration, Instant},
};

use async_trait::async_trait;
use rolodex_core::{
  outbound::{KeyValueCache, OutboundError},
  user::User,
};

use crate::AuthError;

// ─── In-process backend ──────────────────────────────────────────────────────

/// A [`KeyValueCache`] held in process memory. An expired entry is dropped
/// when it is read, and every write sweeps all expired entries.
#[derive(Default)]
pub struct MemoryCache {
  entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
  pub fn new() -> Self { Self::default() }

  fn lock(
    &self,
  ) -> Result<std::sync::MutexGuard<'_, HashMap<String, (String, Instant)>>, OutboundError>
  {
    self
      .entries
      .lock()
      .map_err(|_| OutboundError::new("memory-cache", "lock poisoned"))
  }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
  async fn get(&self, key: &str) -> Result<Option<String>, OutboundError> {
    let now         = Instant::now();
    let mut entries = self.lock()?;
    if matches!(entries.get(key), Some((_, expires_at)) if *expires_at <= now) {
      entries.remove(key);
      return Ok(None);
    }
    Ok(entries.get(key).map(|(value, _)| value.clone()))
  }

  async fn set(
    &self,
    key: &str,
    value: String,
    ttl: Duration,
  ) -> Result<(), OutboundError> {
    let now         = Instant::now();
    let mut entries = self.lock()?;
    entries.retain(|_, (_, expires_at)| *expires_at > now);
    entries.insert(key.to_owned(), (value, now + ttl));
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), OutboundError> {
    self.lock()?.remove(key);
    Ok(())
  }
}

// ─── Session cache ───────────────────────────────────────────────────────────

/// Cache-aside snapshots of [`User`] records keyed by username.
///
/// A hit is trusted as-is. Changes made to the directory behind the cache's
/// back stay invisible until the entry expires or is replaced.
#[derive(Clone)]
pub struct SessionCache {
  backend: Arc<dyn KeyValueCache>,
  ttl:     Duration,
}

impl SessionCache {
  pub fn new(backend: Arc<dyn KeyValueCache>, ttl: Duration) -> Self {
    Self { backend, ttl }
  }

  fn key(username: &str) -> String { format!("user:{username}") }

  /// A corrupt entry is logged and reported as a miss.
  pub async fn get(&self, username: &str) -> Result<Option<User>, AuthError> {
    let raw = self
      .backend
      .get(&Self::key(username))
      .await
      .map_err(|e| AuthError::Cache(e.to_string()))?;

    let Some(raw) = raw else { return Ok(None) };
    match serde_json::from_str(&raw) {
      Ok(user) => Ok(Some(user)),
      Err(e) => {
        tracing::warn!(%username, error = %e, "discarding unreadable session cache entry");
        Ok(None)
      }
    }
  }

  pub async fn put(&self, user: &User) -> Result<(), AuthError> {
    let value = serde_json::to_string(user)
      .map_err(|e| AuthError::Directory(e.into()))?;
    self
      .backend
      .set(&Self::key(&user.username), value, self.ttl)
      .await
      .map_err(|e| AuthError::Cache(e.to_string()))
  }

  pub async fn evict(&self, username: &str) -> Result<(), AuthError> {
    self
      .backend
      .delete(&Self::key(username))
      .await
      .map_err(|e| AuthError::Cache(e.to_string()))
  }
}
