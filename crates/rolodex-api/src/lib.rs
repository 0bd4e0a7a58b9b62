//! HTTP surface for Rolodex.
//!
//! Exposes an axum [`Router`] under `/api` backed by any store implementing
//! [`UserDirectory`], [`ContactStore`] and [`Health`]. Uploaded media is
//! served from `media_dir` under `/media`.

pub mod accounts;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod mailer;
pub mod media;
pub mod throttle;

#[cfg(test)]
mod tests;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  middleware,
  routing::{get, patch, post},
};
use rolodex_auth::{Authorizer, SessionCache, TokenService};
use rolodex_core::{
  outbound::{KeyValueCache, Mailer, MediaHost},
  store::{ContactStore, Health, UserDirectory},
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use handlers::{auth, contacts, health, users};
use throttle::RateLimiter;

/// A backend that serves both users and their contacts.
pub trait Backend: UserDirectory + ContactStore + Health + 'static {}

impl<T: UserDirectory + ContactStore + Health + 'static> Backend for T {}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROLODEX_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                      String,
  #[serde(default = "default_port")]
  pub port:                      u16,
  /// Public origin used in emailed links.
  pub base_url:                  String,
  pub store_path:                PathBuf,
  pub jwt_secret:                String,
  #[serde(default = "default_ttl_seconds")]
  pub jwt_expiration_seconds:    u64,
  #[serde(default = "default_ttl_seconds")]
  pub session_cache_ttl_seconds: u64,
  pub media_dir:                 PathBuf,
  /// Public URL of `media_dir`, normally `<base_url>/media`.
  pub media_base_url:            String,
  /// Per-client quota for `GET /users/me`.
  #[serde(default = "default_me_requests_per_minute")]
  pub me_requests_per_minute:    u32,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8000 }

fn default_ttl_seconds() -> u64 { 3600 }

fn default_me_requests_per_minute() -> u32 { 10 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:      Arc<S>,
  pub config:     Arc<ServerConfig>,
  pub auth:       Authorizer<S>,
  pub mailer:     Arc<dyn Mailer>,
  pub media:      Arc<dyn MediaHost>,
  pub me_limiter: Arc<RateLimiter>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      config:     Arc::clone(&self.config),
      auth:       self.auth.clone(),
      mailer:     Arc::clone(&self.mailer),
      media:      Arc::clone(&self.media),
      me_limiter: Arc::clone(&self.me_limiter),
    }
  }
}

impl<S: Backend> AppState<S> {
  pub fn new(
    store:  Arc<S>,
    config: ServerConfig,
    cache:  Arc<dyn KeyValueCache>,
    mailer: Arc<dyn Mailer>,
    media:  Arc<dyn MediaHost>,
  ) -> Self {
    let tokens = TokenService::new(
      config.jwt_secret.as_bytes(),
      Duration::from_secs(config.jwt_expiration_seconds),
    );
    let sessions = SessionCache::new(
      cache,
      Duration::from_secs(config.session_cache_ttl_seconds),
    );
    Self {
      auth: Authorizer::new(tokens, sessions, Arc::clone(&store)),
      me_limiter: Arc::new(RateLimiter::per_minute(config.me_requests_per_minute)),
      store,
      config: Arc::new(config),
      mailer,
      media,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S: Backend>(state: AppState<S>) -> Router {
  let me_limit = middleware::from_fn_with_state(state.clone(), throttle::limit_me::<S>);

  let api = Router::new()
    .route("/healthchecker",                 get(health::healthchecker::<S>))
    // Auth
    .route("/auth/register",                 post(auth::register::<S>))
    .route("/auth/login",                    post(auth::login::<S>))
    .route("/auth/confirmed_email/{token}",  get(auth::confirmed_email::<S>))
    .route("/auth/request_email",            post(auth::request_email::<S>))
    .route("/auth/request_password_reset",   post(auth::request_password_reset::<S>))
    .route("/auth/password_reset/{token}",   post(auth::password_reset::<S>))
    // Users
    .route("/users/me",                      get(users::me).route_layer(me_limit))
    .route("/users/avatar",                  patch(users::update_avatar::<S>))
    // Contacts
    .route("/contacts",                      get(contacts::list::<S>).post(contacts::create::<S>))
    .route("/contacts/search",               get(contacts::search::<S>))
    .route("/contacts/birthdays",            get(contacts::birthdays::<S>))
    .route(
      "/contacts/{id}",
      get(contacts::get_one::<S>)
        .put(contacts::update::<S>)
        .delete(contacts::remove::<S>),
    );

  let media = ServeDir::new(&state.config.media_dir);

  Router::new()
    .nest("/api", api)
    .nest_service("/media", media)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
