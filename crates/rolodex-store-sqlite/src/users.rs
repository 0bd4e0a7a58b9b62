//! [`UserDirectory`] implementation for [`SqliteStore`].

use chrono::Utc;
use rolodex_core::{
  store::UserDirectory,
  user::{NewUser, Role, User},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{RawUser, encode_dt, encode_role, encode_uuid, user_conflict},
  schema::USER_COLUMNS,
};

impl SqliteStore {
  /// Fetch one user by an exact match on `column`.
  async fn user_where(
    &self,
    column: &'static str,
    value: String,
  ) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
            rusqlite::params![value],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  /// Run `UPDATE users SET <assignment> WHERE email = ?1` and return the
  /// updated row, or `UserNotFound` if no row matched.
  async fn update_user_by_email(
    &self,
    email: &str,
    assignment: &'static str,
    value: rusqlite::types::Value,
  ) -> Result<User> {
    let email_owned = email.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE users SET {assignment} WHERE email = ?1
               RETURNING {USER_COLUMNS}"
            ),
            rusqlite::params![email_owned, value],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    match raw {
      Some(raw) => raw.into_user(),
      None => Err(rolodex_core::Error::UserNotFound(email.to_owned()).into()),
    }
  }
}

impl UserDirectory for SqliteStore {
  type Error = Error;

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      input.username,
      email:         input.email,
      password_hash: input.password_hash,
      confirmed:     false,
      avatar:        input.avatar,
      role:          Role::User,
      created_at:    Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let username = user.username.clone();
    let email    = user.email.clone();
    let hash     = user.password_hash.clone();
    let avatar   = user.avatar.clone();
    let role_str = encode_role(user.role);
    let at_str   = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             user_id, username, email, password_hash, confirmed, avatar, role, created_at
           ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7)",
          rusqlite::params![id_str, username, email, hash, avatar, role_str, at_str],
        )?;
        Ok(())
      })
      .await;

    match inserted {
      Ok(()) => Ok(user),
      Err(e) => match user_conflict(&e) {
        Some(field) => Err(rolodex_core::Error::DuplicateUser(field).into()),
        None => Err(e.into()),
      },
    }
  }

  async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
    self.user_where("user_id", encode_uuid(id)).await
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
    self.user_where("username", username.to_owned()).await
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
    self.user_where("email", email.to_owned()).await
  }

  async fn confirm_email(&self, email: &str) -> Result<User> {
    self
      .update_user_by_email(email, "confirmed = ?2", 1_i64.into())
      .await
  }

  async fn set_avatar(&self, email: &str, url: &str) -> Result<User> {
    self
      .update_user_by_email(email, "avatar = ?2", url.to_owned().into())
      .await
  }

  async fn set_password_hash(&self, email: &str, password_hash: &str) -> Result<User> {
    self
      .update_user_by_email(
        email,
        "password_hash = ?2",
        password_hash.to_owned().into(),
      )
      .await
  }

  async fn set_role(&self, email: &str, role: Role) -> Result<User> {
    self
      .update_user_by_email(email, "role = ?2", encode_role(role).to_owned().into())
      .await
  }
}
