//! The `UserDirectory`, `ContactStore` and `Health` traits.
//!
//! Both are implemented by storage backends (e.g. `rolodex-store-sqlite`).
//! Higher layers (`rolodex-auth`, `rolodex-api`) depend on these
//! abstractions, not on any concrete backend.
//!
//! Every backend error converts into [`crate::Error`]; unique-constraint
//! violations must arrive as [`crate::Error::DuplicateUser`] or
//! [`crate::Error::DuplicateContact`], never as a raw storage error.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  contact::{Contact, ContactPatch, NewContact},
  user::{NewUser, Role, User},
};

// ─── Users ───────────────────────────────────────────────────────────────────

/// Persistent store of user records.
///
/// Lookups return `None` on a miss. Mutations look the user up by email first
/// and fail with [`crate::Error::UserNotFound`] if there is no such user.
pub trait UserDirectory: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  /// Insert a new, unconfirmed user with role [`Role::User`].
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user_by_id(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Set the email-confirmed flag. Idempotent.
  fn confirm_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  fn set_avatar<'a>(
    &'a self,
    email: &'a str,
    url: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  fn set_password_hash<'a>(
    &'a self,
    email: &'a str,
    password_hash: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  fn set_role<'a>(
    &'a self,
    email: &'a str,
    role: Role,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;
}

// ─── Contacts ────────────────────────────────────────────────────────────────

/// Owner-scoped storage of contacts.
///
/// Every method takes the owning user's id and only ever observes or mutates
/// rows belonging to that owner. A contact owned by someone else behaves
/// exactly like a contact that does not exist.
pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  /// Page through the owner's contacts, ordered by first name.
  fn list_contacts(
    &self,
    owner: Uuid,
    offset: usize,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  fn get_contact(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Case-insensitive substring match on first name, last name, or email.
  fn search_contacts<'a>(
    &'a self,
    owner: Uuid,
    text: &'a str,
    offset: usize,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + 'a;

  /// Contacts whose birthday month-day falls in the seven days starting at
  /// `today`, ignoring the year. See [`crate::birthday::BirthdayWindow`].
  fn upcoming_birthdays(
    &self,
    owner: Uuid,
    today: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// Fails with [`crate::Error::DuplicateContact`] naming the colliding field.
  fn create_contact(
    &self,
    owner: Uuid,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Returns `None` if the owner has no such contact.
  fn update_contact(
    &self,
    owner: Uuid,
    id: Uuid,
    patch: ContactPatch,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Returns the removed contact, or `None` if the owner has no such contact.
  fn delete_contact(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;
}

// ─── Health ──────────────────────────────────────────────────────────────────

/// Liveness check for a storage backend.
pub trait Health: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  /// Round-trip a trivial query.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
