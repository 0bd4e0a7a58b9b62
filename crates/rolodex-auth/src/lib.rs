//! Credentials, tokens, and request identity for Rolodex.
//!
//! - [`password`]: argon2 hashing, run off the async scheduler.
//! - [`token`]: HS256 session and action tokens.
//! - [`cache`]: an in-process TTL key-value cache and the username-keyed
//!   [`SessionCache`] built on any [`rolodex_core::outbound::KeyValueCache`].
//! - [`guard`]: the [`Authorizer`] that turns a bearer token into a [`User`].
//!
//! [`User`]: rolodex_core::user::User

pub mod cache;
pub mod error;
pub mod guard;
pub mod password;
pub mod token;

pub use cache::{MemoryCache, SessionCache};
pub use error::AuthError;
pub use guard::{Authorizer, require_admin};
pub use token::{Claims, TokenKind, TokenService};
