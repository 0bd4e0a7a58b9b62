//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, birthdays are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use rolodex_core::{
  contact::{Contact, ContactField},
  user::{Role, User, UserField},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "user" => Ok(Role::User),
    "admin" => Ok(Role::Admin),
    other => Err(Error::UnknownRole(other.to_owned())),
  }
}

// ─── Constraint violations ───────────────────────────────────────────────────

/// The SQLite message of a UNIQUE violation, if `err` is one.
///
/// SQLite reports these as `UNIQUE constraint failed: table.col, table.col`.
fn unique_violation(err: &tokio_rusqlite::Error) -> Option<&str> {
  match err {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      e,
      Some(msg),
    )) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => {
      Some(msg.as_str())
    }
    _ => None,
  }
}

pub fn contact_conflict(err: &tokio_rusqlite::Error) -> Option<ContactField> {
  let msg = unique_violation(err)?;
  if msg.contains("contacts.email") {
    Some(ContactField::Email)
  } else if msg.contains("contacts.phone_number") {
    Some(ContactField::PhoneNumber)
  } else {
    None
  }
}

pub fn user_conflict(err: &tokio_rusqlite::Error) -> Option<UserField> {
  let msg = unique_violation(err)?;
  if msg.contains("users.email") {
    Some(UserField::Email)
  } else if msg.contains("users.username") {
    Some(UserField::Username)
  } else {
    None
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub confirmed:     bool,
  pub avatar:        Option<String>,
  pub role:          String,
  pub created_at:    String,
}

impl RawUser {
  /// Column order must match [`crate::schema::USER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      confirmed:     row.get(4)?,
      avatar:        row.get(5)?,
      role:          row.get(6)?,
      created_at:    row.get(7)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      username:      self.username,
      email:         self.email,
      password_hash: self.password_hash,
      confirmed:     self.confirmed,
      avatar:        self.avatar,
      role:          decode_role(&self.role)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `contacts` row.
pub struct RawContact {
  pub contact_id:      String,
  pub owner_id:        String,
  pub first_name:      String,
  pub last_name:       Option<String>,
  pub email:           String,
  pub phone_number:    String,
  pub birthday:        String,
  pub additional_data: Option<String>,
}

impl RawContact {
  /// Column order must match [`crate::schema::CONTACT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      contact_id:      row.get(0)?,
      owner_id:        row.get(1)?,
      first_name:      row.get(2)?,
      last_name:       row.get(3)?,
      email:           row.get(4)?,
      phone_number:    row.get(5)?,
      birthday:        row.get(6)?,
      additional_data: row.get(7)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      contact_id:      decode_uuid(&self.contact_id)?,
      owner_id:        decode_uuid(&self.owner_id)?,
      first_name:      self.first_name,
      last_name:       self.last_name,
      email:           self.email,
      phone_number:    self.phone_number,
      birthday:        decode_date(&self.birthday)?,
      additional_data: self.additional_data,
    })
  }
}
