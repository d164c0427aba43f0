use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::OptionalExtension;
use tracing::info;

use murmur_types::api::PageQuery;
use murmur_types::models::Micropost;
use murmur_types::validation::validate_micropost;

use crate::models::{MICROPOST_COLUMNS, micropost_from_row};
use crate::relationships::ensure_user;
use crate::{Database, DbError, Result, format_ts, now};

impl Database {
    pub fn create_micropost(&self, user_id: i64, content: &str) -> Result<Micropost> {
        self.create_micropost_at(user_id, content, now())
    }

    /// Create with an explicit creation time (imports, backfills, fixtures).
    pub fn create_micropost_at(
        &self,
        user_id: i64,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Micropost> {
        validate_micropost(content).into_result()?;
        let created_at = created_at.trunc_subsecs(6);

        let id = self.with_conn(|conn| {
            ensure_user(conn, user_id)?;
            conn.execute(
                "INSERT INTO microposts (user_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                (user_id, content, format_ts(created_at)),
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        info!(micropost_id = id, user_id, "Micropost created");
        Ok(Micropost {
            id,
            user_id,
            content: content.to_string(),
            created_at,
            updated_at: created_at,
        })
    }

    pub fn get_micropost(&self, id: i64) -> Result<Option<Micropost>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {MICROPOST_COLUMNS} FROM microposts WHERE id = ?1"),
                    [id],
                    micropost_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// A user's own microposts, newest first.
    pub fn user_microposts(&self, user_id: i64, page: PageQuery) -> Result<Vec<Micropost>> {
        let (limit, offset) = page.limit_offset();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MICROPOST_COLUMNS}
                 FROM microposts
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map((user_id, limit, offset), micropost_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_microposts(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM microposts WHERE user_id = ?1",
                [user_id],
                |r| r.get(0),
            )?)
        })
    }

    pub fn destroy_micropost(&self, id: i64) -> Result<()> {
        let deleted = self
            .with_conn(|conn| Ok(conn.execute("DELETE FROM microposts WHERE id = ?1", [id])?))?;
        if deleted == 0 {
            return Err(DbError::not_found("micropost", id));
        }
        info!(micropost_id = id, "Micropost destroyed");
        Ok(())
    }
}
