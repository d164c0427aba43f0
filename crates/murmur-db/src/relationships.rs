use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use murmur_types::models::{Relationship, User};
use murmur_types::validation::ValidationErrors;

use crate::models::{UserRow, get_ts};
use crate::{Database, DbError, Result, format_ts, now};

impl Database {
    /// Make `follower_id` follow `followed_id`. Following an already-followed
    /// user leaves the single existing edge untouched.
    pub fn follow(&self, follower_id: i64, followed_id: i64) -> Result<()> {
        if follower_id == followed_id {
            return Err(ValidationErrors::single("followed_id", "can't be yourself").into());
        }

        let inserted = self.with_conn(|conn| {
            ensure_user(conn, follower_id)?;
            ensure_user(conn, followed_id)?;
            let ts = format_ts(now());
            let inserted = conn.execute(
                "INSERT INTO relationships (follower_id, followed_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(follower_id, followed_id) DO NOTHING",
                (follower_id, followed_id, ts),
            )?;
            Ok(inserted)
        })?;

        if inserted > 0 {
            info!(follower_id, followed_id, "Follow");
        }
        Ok(())
    }

    /// Remove the edge if present. Returns whether anything was removed.
    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        let removed = self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM relationships WHERE follower_id = ?1 AND followed_id = ?2",
                (follower_id, followed_id),
            )?)
        })?;

        if removed > 0 {
            info!(follower_id, followed_id, "Unfollow");
        }
        Ok(removed > 0)
    }

    pub fn is_following(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        Ok(self.relationship(follower_id, followed_id)?.is_some())
    }

    pub fn relationship(&self, follower_id: i64, followed_id: i64) -> Result<Option<Relationship>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT follower_id, followed_id, created_at, updated_at
                     FROM relationships
                     WHERE follower_id = ?1 AND followed_id = ?2",
                    (follower_id, followed_id),
                    |row| {
                        Ok(Relationship {
                            follower_id: row.get(0)?,
                            followed_id: row.get(1)?,
                            created_at: get_ts(row, 2)?,
                            updated_at: get_ts(row, 3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Users that `user_id` follows.
    pub fn following(&self, user_id: i64) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            query_related(
                conn,
                "JOIN relationships r ON r.followed_id = u.id WHERE r.follower_id = ?1",
                user_id,
            )
        })
    }

    /// Users following `user_id`.
    pub fn followers(&self, user_id: i64) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            query_related(
                conn,
                "JOIN relationships r ON r.follower_id = u.id WHERE r.followed_id = ?1",
                user_id,
            )
        })
    }

    pub fn following_count(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM relationships WHERE follower_id = ?1",
                [user_id],
                |r| r.get(0),
            )?)
        })
    }

    pub fn followers_count(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM relationships WHERE followed_id = ?1",
                [user_id],
                |r| r.get(0),
            )?)
        })
    }
}

fn query_related(conn: &Connection, join: &str, user_id: i64) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT u.id, u.name, u.email, u.encrypted_password, u.salt, u.admin, u.created_at, u.updated_at
         FROM users u {join}
         ORDER BY u.id"
    ))?;

    let users = stmt
        .query_map([user_id], UserRow::from_row)?
        .map(|r| r.map(User::from))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(users)
}

pub(crate) fn ensure_user(conn: &Connection, id: i64) -> Result<()> {
    let exists = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |_| Ok(()))
        .optional()?
        .is_some();
    if exists {
        Ok(())
    } else {
        Err(DbError::not_found("user", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{db, user};

    #[test]
    fn follow_and_query_both_directions() {
        let db = db();
        let a = user(&db, "User A", "a@example.com");
        let b = user(&db, "User B", "b@example.com");

        db.follow(a.id, b.id).unwrap();

        assert!(db.is_following(a.id, b.id).unwrap());
        assert!(!db.is_following(b.id, a.id).unwrap());
        assert_eq!(db.following(a.id).unwrap(), vec![b.clone()]);
        assert_eq!(db.followers(b.id).unwrap(), vec![a.clone()]);
        assert!(db.following(b.id).unwrap().is_empty());
        assert!(db.followers(a.id).unwrap().is_empty());
    }

    #[test]
    fn follow_twice_keeps_one_edge() {
        let db = db();
        let a = user(&db, "User A", "a@example.com");
        let b = user(&db, "User B", "b@example.com");

        db.follow(a.id, b.id).unwrap();
        let first = db.relationship(a.id, b.id).unwrap().unwrap();
        db.follow(a.id, b.id).unwrap();

        assert_eq!(db.following_count(a.id).unwrap(), 1);
        assert_eq!(db.followers_count(b.id).unwrap(), 1);
        assert_eq!(db.relationship(a.id, b.id).unwrap(), Some(first));
    }

    #[test]
    fn unfollow_removes_edge_and_is_noop_otherwise() {
        let db = db();
        let a = user(&db, "User A", "a@example.com");
        let b = user(&db, "User B", "b@example.com");

        assert!(!db.unfollow(a.id, b.id).unwrap());

        db.follow(a.id, b.id).unwrap();
        assert!(db.unfollow(a.id, b.id).unwrap());
        assert!(!db.is_following(a.id, b.id).unwrap());
        assert!(!db.unfollow(a.id, b.id).unwrap());
    }

    #[test]
    fn cannot_follow_self() {
        let db = db();
        let a = user(&db, "User A", "a@example.com");

        match db.follow(a.id, a.id) {
            Err(DbError::Validation(errors)) => assert!(errors.has("followed_id")),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(db.following_count(a.id).unwrap(), 0);
    }

    #[test]
    fn follow_unknown_user_is_not_found() {
        let db = db();
        let a = user(&db, "User A", "a@example.com");
        assert!(matches!(
            db.follow(a.id, 999),
            Err(DbError::NotFound { entity: "user", id: 999 })
        ));
    }

    #[test]
    fn destroying_either_endpoint_removes_edges() {
        let db = db();
        let a = user(&db, "User A", "a@example.com");
        let b = user(&db, "User B", "b@example.com");
        let c = user(&db, "User C", "c@example.com");

        db.follow(a.id, b.id).unwrap();
        db.follow(c.id, a.id).unwrap();
        db.destroy_user(a.id).unwrap();

        assert!(db.followers(b.id).unwrap().is_empty());
        assert!(db.following(c.id).unwrap().is_empty());
    }
}
