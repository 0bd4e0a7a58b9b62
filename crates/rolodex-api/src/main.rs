//! Rolodex API server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `ROLODEX_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP.
//!
//! ```text
//! server                      # serve (default)
//! server promote <username>   # grant the admin role
//! ```

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rolodex_api::{AppState, ServerConfig, mailer::LogMailer, media::DiskMediaHost};
use rolodex_auth::MemoryCache;
use rolodex_core::{store::UserDirectory, user::Role};
use rolodex_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Rolodex contacts API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API.
  Serve,
  /// Grant the admin role to an existing user.
  Promote { username: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ROLODEX"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  server_cfg.media_dir  = expand_tilde(&server_cfg.media_dir);

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(server_cfg, store).await,
    Command::Promote { username } => promote(&store, &username).await,
  }
}

async fn serve(server_cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let media   = DiskMediaHost::new(&server_cfg.media_dir, server_cfg.media_base_url.clone());

  let state = AppState::new(
    Arc::new(store),
    server_cfg,
    Arc::new(MemoryCache::new()),
    Arc::new(LogMailer),
    Arc::new(media),
  );
  let app = rolodex_api::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  // Peer addresses key the per-client rate limit.
  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

async fn promote(store: &SqliteStore, username: &str) -> anyhow::Result<()> {
  let user = store
    .get_user_by_username(username)
    .await?
    .with_context(|| format!("no user named {username:?}"))?;

  store.set_role(&user.email, Role::Admin).await?;
  // A running server keeps serving its cached snapshot until it expires.
  tracing::info!(%username, "granted admin role");
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
