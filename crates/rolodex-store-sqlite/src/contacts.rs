//! [`ContactStore`] implementation for [`SqliteStore`].
//!
//! Every statement carries `owner_id = ?` so a foreign contact is
//! indistinguishable from a missing one.

use chrono::NaiveDate;
use rolodex_core::{
  birthday::BirthdayWindow,
  contact::{Contact, ContactPatch, NewContact},
  store::ContactStore,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{RawContact, contact_conflict, encode_date, encode_uuid},
  schema::CONTACT_COLUMNS,
};

fn sql_int(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

/// Map a write failure to `DuplicateContact` when it is a per-owner unique
/// violation, otherwise pass it through.
fn translate_write_error(e: tokio_rusqlite::Error) -> Error {
  match contact_conflict(&e) {
    Some(field) => rolodex_core::Error::DuplicateContact(field).into(),
    None => e.into(),
  }
}

fn decode_all(raws: Vec<RawContact>) -> Result<Vec<Contact>> {
  raws.into_iter().map(RawContact::into_contact).collect()
}

impl ContactStore for SqliteStore {
  type Error = Error;

  async fn list_contacts(
    &self,
    owner:  Uuid,
    offset: usize,
    limit:  usize,
  ) -> Result<Vec<Contact>> {
    let owner_str = encode_uuid(owner);

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts
           WHERE owner_id = ?1
           ORDER BY first_name, contact_id
           LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![owner_str, sql_int(limit), sql_int(offset)],
            RawContact::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_all(raws)
  }

  async fn get_contact(&self, owner: Uuid, id: Uuid) -> Result<Option<Contact>> {
    let owner_str = encode_uuid(owner);
    let id_str    = encode_uuid(id);

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {CONTACT_COLUMNS} FROM contacts
               WHERE contact_id = ?1 AND owner_id = ?2"
            ),
            rusqlite::params![id_str, owner_str],
            RawContact::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn search_contacts(
    &self,
    owner:  Uuid,
    text:   &str,
    offset: usize,
    limit:  usize,
  ) -> Result<Vec<Contact>> {
    let owner_str = encode_uuid(owner);
    // Compared with `instr`, so `%` and `_` match themselves.
    let needle    = text.to_lowercase();

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts
           WHERE owner_id = ?1
             AND (instr(casefold(first_name), ?2) > 0
               OR instr(casefold(last_name),  ?2) > 0
               OR instr(casefold(email),      ?2) > 0)
           ORDER BY first_name, contact_id
           LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![owner_str, needle, sql_int(limit), sql_int(offset)],
            RawContact::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_all(raws)
  }

  async fn upcoming_birthdays(
    &self,
    owner: Uuid,
    today: NaiveDate,
  ) -> Result<Vec<Contact>> {
    let window    = BirthdayWindow::starting(today);
    let owner_str = encode_uuid(owner);
    let start     = window.start.to_string();
    let end       = window.end.to_string();

    // A window crossing New Year is two ranges: [start, 12-31] OR [01-01, end].
    let range = if window.wraps() {
      "(strftime('%m-%d', birthday) >= ?2 OR strftime('%m-%d', birthday) <= ?3)"
    } else {
      "strftime('%m-%d', birthday) BETWEEN ?2 AND ?3"
    };

    tracing::debug!(%owner, %start, %end, wraps = window.wraps(), "birthday window");

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        // Sort by days-until-birthday: this year's dates first, then January.
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts
           WHERE owner_id = ?1 AND {range}
           ORDER BY strftime('%m-%d', birthday) < ?2,
                    strftime('%m-%d', birthday),
                    first_name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str, start, end], RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_all(raws)
  }

  async fn create_contact(&self, owner: Uuid, input: NewContact) -> Result<Contact> {
    let contact = Contact {
      contact_id:      Uuid::new_v4(),
      owner_id:        owner,
      first_name:      input.first_name,
      last_name:       input.last_name,
      email:           input.email,
      phone_number:    input.phone_number,
      birthday:        input.birthday,
      additional_data: input.additional_data,
    };

    let id_str       = encode_uuid(contact.contact_id);
    let owner_str    = encode_uuid(owner);
    let first_name   = contact.first_name.clone();
    let last_name    = contact.last_name.clone();
    let email        = contact.email.clone();
    let phone_number = contact.phone_number.clone();
    let birthday_str = encode_date(contact.birthday);
    let note         = contact.additional_data.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contacts (
             contact_id, owner_id, first_name, last_name,
             email, phone_number, birthday, additional_data
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            owner_str,
            first_name,
            last_name,
            email,
            phone_number,
            birthday_str,
            note,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(translate_write_error)?;

    Ok(contact)
  }

  async fn update_contact(
    &self,
    owner: Uuid,
    id:    Uuid,
    patch: ContactPatch,
  ) -> Result<Option<Contact>> {
    let owner_str    = encode_uuid(owner);
    let id_str       = encode_uuid(id);
    let birthday_str = patch.birthday.map(encode_date);
    let set_last     = patch.last_name.is_some();
    let last_name    = patch.last_name.flatten();
    let set_note     = patch.additional_data.is_some();
    let note         = patch.additional_data.flatten();
    let first_name   = patch.first_name;
    let email        = patch.email;
    let phone_number = patch.phone_number;

    // NULL leaves a required column untouched; the nullable ones carry an
    // explicit flag so NULL can clear them.
    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE contacts SET
                 first_name      = COALESCE(?3, first_name),
                 last_name       = CASE WHEN ?4 THEN ?5 ELSE last_name END,
                 email           = COALESCE(?6, email),
                 phone_number    = COALESCE(?7, phone_number),
                 birthday        = COALESCE(?8, birthday),
                 additional_data = CASE WHEN ?9 THEN ?10 ELSE additional_data END
               WHERE contact_id = ?1 AND owner_id = ?2
               RETURNING {CONTACT_COLUMNS}"
            ),
            rusqlite::params![
              id_str,
              owner_str,
              first_name,
              set_last,
              last_name,
              email,
              phone_number,
              birthday_str,
              set_note,
              note,
            ],
            RawContact::from_row,
          )
          .optional()?)
      })
      .await
      .map_err(translate_write_error)?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn delete_contact(&self, owner: Uuid, id: Uuid) -> Result<Option<Contact>> {
    let owner_str = encode_uuid(owner);
    let id_str    = encode_uuid(id);

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "DELETE FROM contacts
               WHERE contact_id = ?1 AND owner_id = ?2
               RETURNING {CONTACT_COLUMNS}"
            ),
            rusqlite::params![id_str, owner_str],
            RawContact::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }
}
