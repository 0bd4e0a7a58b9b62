//! SQLite backend for the Rolodex user directory and contact store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod contacts;
mod encode;
mod schema;
mod store;
mod users;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
