//! [`SqliteStore`]: one SQLite file backing both the user directory and the
//! contact store.

use std::path::Path;

use rolodex_core::store::Health;
use rusqlite::functions::FunctionFlags;

use crate::{Error, Result, schema::SCHEMA};

/// A Rolodex store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema initialised");
    Ok(())
  }
}

/// `casefold(text)`: Unicode lowercase. SQLite's own `lower` and `LIKE` only
/// fold ASCII. NULL stays NULL.
fn register_functions(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    "casefold",
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      let text: Option<String> = ctx.get(0)?;
      Ok(text.map(|t| t.to_lowercase()))
    },
  )
}

impl Health for SqliteStore {
  type Error = Error;

  async fn ping(&self) -> Result<()> {
    let one: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get(0))?))
      .await?;
    if one == 1 {
      Ok(())
    } else {
      Err(Error::Ping(one))
    }
  }
}
