//! Fixed-window request limiting, keyed by client IP.
//!
//! Applied as a route layer, so a request is counted before any extractor
//! runs. Requests without [`ConnectInfo`] (in-process callers) share one
//! bucket.

use std::{
  collections::HashMap,
  net::{IpAddr, SocketAddr},
  sync::{Mutex, PoisonError},
  time::{Duration, Instant},
};

use axum::{
  extract::{ConnectInfo, Request, State},
  middleware::Next,
  response::{IntoResponse, Response},
};

use crate::{ApiError, AppState, Backend};

pub struct RateLimiter {
  limit:  u32,
  window: Duration,
  hits:   Mutex<HashMap<Option<IpAddr>, Window>>,
}

struct Window {
  started: Instant,
  count:   u32,
}

impl RateLimiter {
  pub fn new(limit: u32, window: Duration) -> Self {
    Self { limit, window, hits: Mutex::new(HashMap::new()) }
  }

  pub fn per_minute(limit: u32) -> Self { Self::new(limit, Duration::from_secs(60)) }

  pub fn limit(&self) -> u32 { self.limit }

  /// Count one request from `client`. Once the window's quota is spent,
  /// returns how long until it resets.
  pub fn check(&self, client: Option<IpAddr>) -> Result<(), Duration> {
    let now      = Instant::now();
    let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);
    hits.retain(|_, w| now.duration_since(w.started) < self.window);

    let w = hits.entry(client).or_insert(Window { started: now, count: 0 });
    if w.count >= self.limit {
      return Err(self.window.saturating_sub(now.duration_since(w.started)));
    }
    w.count += 1;
    Ok(())
  }
}

/// Route layer for `GET /users/me`.
pub async fn limit_me<S: Backend>(
  State(state): State<AppState<S>>,
  request: Request,
  next: Next,
) -> Response {
  let client = request
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.ip());

  match state.me_limiter.check(client) {
    Ok(()) => next.run(request).await,
    Err(reset) => {
      tracing::warn!(?client, path = %request.uri().path(), "rate limit exceeded");
      ApiError::RateLimited {
        limit:       state.me_limiter.limit(),
        retry_after: reset.as_secs().max(1),
      }
      .into_response()
    }
  }
}
