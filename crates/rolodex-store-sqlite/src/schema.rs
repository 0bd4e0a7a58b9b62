//! SQL schema for the Rolodex SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE … IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    confirmed     INTEGER NOT NULL DEFAULT 0,
    avatar        TEXT,
    role          TEXT NOT NULL DEFAULT 'user',   -- 'user' | 'admin'
    created_at    TEXT NOT NULL                   -- RFC 3339 UTC
);

-- Uniqueness of email and phone number is scoped to the owner.
CREATE TABLE IF NOT EXISTS contacts (
    contact_id      TEXT PRIMARY KEY,
    owner_id        TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    first_name      TEXT NOT NULL,
    last_name       TEXT,
    email           TEXT NOT NULL,
    phone_number    TEXT NOT NULL,
    birthday        TEXT NOT NULL,                -- YYYY-MM-DD
    additional_data TEXT,
    CONSTRAINT uq_contact_email_user UNIQUE (email, owner_id),
    CONSTRAINT uq_contact_phone_user UNIQUE (phone_number, owner_id)
);

CREATE INDEX IF NOT EXISTS contacts_owner_idx ON contacts(owner_id);

PRAGMA user_version = 1;
";

pub const USER_COLUMNS: &str =
  "user_id, username, email, password_hash, confirmed, avatar, role, created_at";

pub const CONTACT_COLUMNS: &str = "contact_id, owner_id, first_name, last_name, \
   email, phone_number, birthday, additional_data";
