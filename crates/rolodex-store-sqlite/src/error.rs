//! Error type for `rolodex-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain-level failure, e.g. a translated unique-constraint violation.
  #[error(transparent)]
  Core(#[from] rolodex_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("health check returned {0}, expected 1")]
  Ping(i64),
}

impl From<Error> for rolodex_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => rolodex_core::Error::Storage(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
