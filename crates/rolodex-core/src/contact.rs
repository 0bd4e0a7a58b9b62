//! Contact records, owned by a single user.
//!
//! Every contact belongs to exactly one user. Email and phone number are
//! unique per owner, not globally.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{Error, Result, user::validate_email};

pub const NAME_MAX_LEN: usize = 20;
pub const CONTACT_EMAIL_MAX_LEN: usize = 50;
pub const PHONE_MAX_LEN: usize = 15;
pub const NOTE_MAX_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub contact_id:      Uuid,
  pub owner_id:        Uuid,
  pub first_name:      String,
  pub last_name:       Option<String>,
  pub email:           String,
  pub phone_number:    String,
  pub birthday:        NaiveDate,
  /// Free-text note.
  pub additional_data: Option<String>,
}

/// Input to [`crate::store::ContactStore::create_contact`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContact {
  pub first_name:      String,
  #[serde(default)]
  pub last_name:       Option<String>,
  pub email:           String,
  pub phone_number:    String,
  pub birthday:        NaiveDate,
  #[serde(default)]
  pub additional_data: Option<String>,
}

impl NewContact {
  pub fn validate(&self) -> Result<()> {
    check_len("first_name", &self.first_name, NAME_MAX_LEN)?;
    if self.first_name.trim().is_empty() {
      return Err(Error::Validation("first_name must not be empty".into()));
    }
    if let Some(last) = &self.last_name {
      check_len("last_name", last, NAME_MAX_LEN)?;
    }
    validate_email(&self.email, CONTACT_EMAIL_MAX_LEN)?;
    check_phone(&self.phone_number)?;
    if let Some(note) = &self.additional_data {
      check_len("additional_data", note, NOTE_MAX_LEN)?;
    }
    Ok(())
  }
}

/// A partial update. `None` means "leave unchanged".
///
/// The two nullable columns take a second layer: `Some(None)` (an explicit
/// JSON `null`) clears the column, `Some(Some(_))` replaces it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactPatch {
  pub first_name:      Option<String>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub last_name:       Option<Option<String>>,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub birthday:        Option<NaiveDate>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub additional_data: Option<Option<String>>,
}

/// Only called when the key is present, so a `null` becomes `Some(None)`.
/// An absent key falls back to `#[serde(default)]`.
fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(de).map(Some)
}

impl ContactPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(first) = &self.first_name {
      check_len("first_name", first, NAME_MAX_LEN)?;
    }
    if let Some(Some(last)) = &self.last_name {
      check_len("last_name", last, NAME_MAX_LEN)?;
    }
    if let Some(email) = &self.email {
      validate_email(email, CONTACT_EMAIL_MAX_LEN)?;
    }
    if let Some(phone) = &self.phone_number {
      check_phone(phone)?;
    }
    if let Some(Some(note)) = &self.additional_data {
      check_len("additional_data", note, NOTE_MAX_LEN)?;
    }
    Ok(())
  }

  pub fn is_empty(&self) -> bool {
    self.first_name.is_none()
      && self.last_name.is_none()
      && self.email.is_none()
      && self.phone_number.is_none()
      && self.birthday.is_none()
      && self.additional_data.is_none()
  }
}

/// The per-owner unique contact columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
  Email,
  PhoneNumber,
}

impl fmt::Display for ContactField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Email => "email",
      Self::PhoneNumber => "phone number",
    })
  }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
  if value.chars().count() > max {
    return Err(Error::Validation(format!(
      "{field} must be at most {max} characters"
    )));
  }
  Ok(())
}

fn check_phone(phone: &str) -> Result<()> {
  check_len("phone_number", phone, PHONE_MAX_LEN)?;
  if phone.trim().is_empty() {
    return Err(Error::Validation("phone_number must not be empty".into()));
  }
  Ok(())
}
