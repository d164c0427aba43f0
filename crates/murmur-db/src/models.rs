/// Database row types and row mappers.
/// `UserRow` carries credential columns and never leaves this crate's API
/// without going through `User::from`.
use chrono::{DateTime, Utc};
use rusqlite::Row;

use murmur_types::models::{Micropost, User};

pub(crate) const USER_COLUMNS: &str =
    "id, name, email, encrypted_password, salt, admin, created_at, updated_at";

pub(crate) const MICROPOST_COLUMNS: &str = "id, user_id, content, created_at, updated_at";

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub encrypted_password: String,
    pub salt: String,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Expects the columns of [`USER_COLUMNS`] in order.
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            encrypted_password: row.get(3)?,
            salt: row.get(4)?,
            admin: row.get(5)?,
            created_at: get_ts(row, 6)?,
            updated_at: get_ts(row, 7)?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            admin: row.admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Expects the columns of [`MICROPOST_COLUMNS`] in order.
pub(crate) fn micropost_from_row(row: &Row<'_>) -> rusqlite::Result<Micropost> {
    Ok(Micropost {
        id: row.get(0)?,
        user_id: row.get(1)?,
        content: row.get(2)?,
        created_at: get_ts(row, 3)?,
        updated_at: get_ts(row, 4)?,
    })
}

pub(crate) fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
