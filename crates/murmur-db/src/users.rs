use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use murmur_types::api::PageQuery;
use murmur_types::models::User;
use murmur_types::validation::{
    FieldError, PasswordAttrs, UserAttrs, ValidationErrors, validate_password, validate_user,
};

use crate::error::is_unique_violation;
use crate::models::{USER_COLUMNS, UserRow};
use crate::{Database, DbError, Result, format_ts, now};

const EMAIL_TAKEN: &str = "has already been taken";

/// Attributes for a new account, plaintext password included.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirmation: &'a str,
}

/// Partial update; `None` keeps the stored value. The password policy only
/// runs when `password` is present.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

impl Database {
    pub fn create_user(&self, new: NewUser<'_>) -> Result<User> {
        let mut errors = validate_user(UserAttrs {
            name: new.name,
            email: new.email,
        });
        errors.merge(validate_password(PasswordAttrs {
            password: new.password,
            confirmation: new.password_confirmation,
        }));
        if self.with_conn(|conn| email_taken(conn, new.email, None))? {
            errors.push(FieldError::new("email", EMAIL_TAKEN));
        }
        errors.into_result()?;

        let digest = self.hasher().hash(new.password)?;
        let ts = now();

        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, encrypted_password, salt, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                (new.name, new.email, &digest.hash, &digest.salt, format_ts(ts)),
            )
            .map_err(email_conflict)?;
            Ok(conn.last_insert_rowid())
        })?;

        info!(user_id = id, "User created");
        Ok(User {
            id,
            name: new.name.to_string(),
            email: new.email.to_string(),
            admin: false,
            created_at: ts,
            updated_at: ts,
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.get_user_row(id)?.map(User::from))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .with_conn(|conn| query_user_by_email(conn, email))?
            .map(User::from))
    }

    pub(crate) fn get_user_row(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub(crate) fn get_user_row_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    /// Users ordered by id.
    pub fn list_users(&self, page: PageQuery) -> Result<Vec<User>> {
        let (limit, offset) = page.limit_offset();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map((limit, offset), UserRow::from_row)?
                .map(|r| r.map(User::from))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row::<i64, _, _>("SELECT COUNT(*) FROM users", [], |r| r.get(0))?)
        })
    }

    pub fn update_user(&self, id: i64, changes: UserChanges) -> Result<User> {
        let current = self
            .get_user_row(id)?
            .ok_or_else(|| DbError::not_found("user", id))?;

        let name = changes.name.as_deref().unwrap_or(&current.name);
        let email = changes.email.as_deref().unwrap_or(&current.email);

        let mut errors = validate_user(UserAttrs { name, email });
        if let Some(password) = changes.password.as_deref() {
            errors.merge(validate_password(PasswordAttrs {
                password,
                confirmation: changes.password_confirmation.as_deref().unwrap_or(""),
            }));
        }
        if self.with_conn(|conn| email_taken(conn, email, Some(id)))? {
            errors.push(FieldError::new("email", EMAIL_TAKEN));
        }
        errors.into_result()?;

        let digest = changes
            .password
            .as_deref()
            .map(|password| self.hasher().hash(password))
            .transpose()?;
        let (hash, salt) = match &digest {
            Some(d) => (Some(d.hash.as_str()), Some(d.salt.as_str())),
            None => (None, None),
        };

        let updated = self.with_conn(|conn| {
            conn.execute(
                "UPDATE users
                 SET name = ?1,
                     email = ?2,
                     encrypted_password = COALESCE(?3, encrypted_password),
                     salt = COALESCE(?4, salt),
                     updated_at = ?5
                 WHERE id = ?6",
                rusqlite::params![name, email, hash, salt, format_ts(now()), id],
            )
            .map_err(email_conflict)?;
            query_user_by_id(conn, id)
        })?;

        info!(user_id = id, password_changed = digest.is_some(), "User updated");
        updated
            .map(User::from)
            .ok_or_else(|| DbError::not_found("user", id))
    }

    /// Delete a user together with their microposts and every follow edge
    /// touching them. All or nothing.
    pub fn destroy_user(&self, id: i64) -> Result<()> {
        let microposts = self.with_tx(|tx| {
            let microposts: i64 = tx.query_row(
                "SELECT COUNT(*) FROM microposts WHERE user_id = ?1",
                [id],
                |r| r.get(0),
            )?;
            let deleted = tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            if deleted == 0 {
                return Err(DbError::not_found("user", id));
            }
            Ok(microposts)
        })?;

        info!(user_id = id, microposts, "User destroyed");
        Ok(())
    }

    /// Flip the admin flag.
    pub fn toggle_admin(&self, id: i64) -> Result<User> {
        self.update_admin(id, "NOT admin", None)
    }

    /// Idempotent form of [`Database::toggle_admin`].
    pub fn set_admin(&self, id: i64, admin: bool) -> Result<User> {
        self.update_admin(id, "?3", Some(admin))
    }

    fn update_admin(&self, id: i64, expr: &str, admin: Option<bool>) -> Result<User> {
        let row = self.with_conn(|conn| {
            let sql = format!("UPDATE users SET admin = {expr}, updated_at = ?1 WHERE id = ?2");
            let ts = format_ts(now());
            let changed = match admin {
                Some(admin) => conn.execute(&sql, rusqlite::params![ts, id, admin])?,
                None => conn.execute(&sql, rusqlite::params![ts, id])?,
            };
            if changed == 0 {
                return Ok(None);
            }
            query_user_by_id(conn, id)
        })?;

        let user = User::from(row.ok_or_else(|| DbError::not_found("user", id))?);
        info!(user_id = id, admin = user.admin, "Admin flag updated");
        Ok(user)
    }
}

fn email_taken(conn: &Connection, email: &str, except_id: Option<i64>) -> Result<bool> {
    // The column is COLLATE NOCASE, so this comparison ignores ASCII case.
    let taken = conn
        .query_row(
            "SELECT 1 FROM users WHERE email = ?1 AND id IS NOT ?2",
            rusqlite::params![email, except_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    Ok(taken)
}

/// A concurrent insert can slip past `email_taken`; report the constraint
/// the same way as the pre-check.
fn email_conflict(err: rusqlite::Error) -> DbError {
    if is_unique_violation(&err) {
        ValidationErrors::single("email", EMAIL_TAKEN).into()
    } else {
        err.into()
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            [id],
            UserRow::from_row,
        )
        .optional()?;
    Ok(row)
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            [email],
            UserRow::from_row,
        )
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{db, user};

    fn new_user<'a>(name: &'a str, email: &'a str) -> NewUser<'a> {
        NewUser {
            name,
            email,
            password: "foobar",
            password_confirmation: "foobar",
        }
    }

    fn validation(err: DbError) -> ValidationErrors {
        match err {
            DbError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn creates_user_with_defaults() {
        let db = db();
        let created = db.create_user(new_user("Example User", "user@example.com")).unwrap();

        assert!(created.id > 0);
        assert!(!created.admin);
        assert_eq!(db.get_user(created.id).unwrap(), Some(created));
    }

    #[test]
    fn rejects_duplicate_email_ignoring_case() {
        let db = db();
        db.create_user(new_user("First User", "foo@bar.com")).unwrap();

        let err = db.create_user(new_user("Second User", "Foo@Bar.com")).unwrap_err();
        assert_eq!(validation(err).messages("email"), [EMAIL_TAKEN]);
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn unique_constraint_reads_as_email_taken() {
        let db = db();
        user(&db, "First User", "foo@bar.com");

        // Skip the pre-check and let the index reject the row.
        let err = db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO users (name, email, encrypted_password, salt, created_at, updated_at)
                     VALUES ('Racer', 'FOO@bar.com', 'x', 'x', 'now', 'now')",
                    [],
                )
                .map_err(email_conflict)
            })
            .unwrap_err();
        assert_eq!(validation(err).messages("email"), [EMAIL_TAKEN]);

        let other = db
            .with_conn(|conn| {
                conn.execute("INSERT INTO users (name) VALUES ('No Email')", [])
                    .map_err(email_conflict)
            })
            .unwrap_err();
        assert!(matches!(other, DbError::Sqlite(_)));
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn reports_all_failures_at_once() {
        let db = db();
        let err = db
            .create_user(NewUser {
                name: "ab",
                email: "user_at_foo.org",
                password: "short",
                password_confirmation: "other",
            })
            .unwrap_err();

        let errors = validation(err);
        assert!(errors.has("name"));
        assert!(errors.has("email"));
        assert_eq!(errors.messages("password").len(), 2);
        assert_eq!(db.count_users().unwrap(), 0);
    }

    #[test]
    fn finds_by_email_case_insensitively() {
        let db = db();
        let created = user(&db, "Example User", "user@example.com");
        assert_eq!(db.get_user_by_email("USER@example.COM").unwrap(), Some(created));
        assert_eq!(db.get_user_by_email("nobody@example.com").unwrap(), None);
    }

    #[test]
    fn update_keeps_password_unless_given() {
        let db = db();
        let created = user(&db, "Example User", "user@example.com");

        let updated = db
            .update_user(
                created.id,
                UserChanges {
                    name: Some("Renamed User".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Renamed User");
        assert_eq!(updated.email, "user@example.com");
        assert!(db.authenticate("user@example.com", "foobar").unwrap().is_some());

        db.update_user(
            created.id,
            UserChanges {
                password: Some("newsecret".into()),
                password_confirmation: Some("newsecret".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(db.authenticate("user@example.com", "foobar").unwrap().is_none());
        assert!(db.authenticate("user@example.com", "newsecret").unwrap().is_some());
    }

    #[test]
    fn update_validates_password_and_uniqueness() {
        let db = db();
        let a = user(&db, "User A", "a@example.com");
        user(&db, "User B", "b@example.com");

        let err = db
            .update_user(
                a.id,
                UserChanges {
                    email: Some("B@EXAMPLE.COM".into()),
                    password: Some("x".repeat(41)),
                    password_confirmation: Some("x".repeat(41)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        let errors = validation(err);
        assert!(errors.has("email"));
        assert!(errors.has("password"));

        // Own email in different case is not a conflict.
        let same = db
            .update_user(
                a.id,
                UserChanges {
                    email: Some("A@example.com".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(same.email, "A@example.com");
    }

    #[test]
    fn update_missing_user_is_not_found() {
        let db = db();
        let err = db.update_user(42, UserChanges::default()).unwrap_err();
        assert!(matches!(err, DbError::NotFound { entity: "user", id: 42 }));
    }

    #[test]
    fn admin_toggle() {
        let db = db();
        let created = user(&db, "Example User", "user@example.com");
        assert!(!created.admin);

        assert!(db.toggle_admin(created.id).unwrap().admin);
        assert!(!db.toggle_admin(created.id).unwrap().admin);

        assert!(db.set_admin(created.id, true).unwrap().admin);
        assert!(db.set_admin(created.id, true).unwrap().admin);
        assert!(matches!(db.toggle_admin(999), Err(DbError::NotFound { .. })));
    }

    #[test]
    fn destroy_removes_user() {
        let db = db();
        let created = user(&db, "Example User", "user@example.com");

        db.destroy_user(created.id).unwrap();
        assert_eq!(db.get_user(created.id).unwrap(), None);
        assert!(matches!(
            db.destroy_user(created.id),
            Err(DbError::NotFound { .. })
        ));
    }

    #[test]
    fn lists_users_in_id_order() {
        let db = db();
        let a = user(&db, "User A", "a@example.com");
        let b = user(&db, "User B", "b@example.com");
        let c = user(&db, "User C", "c@example.com");

        let first = db.list_users(PageQuery { page: 1, per_page: 2 }).unwrap();
        let second = db.list_users(PageQuery { page: 2, per_page: 2 }).unwrap();
        assert_eq!(first, vec![a, b]);
        assert_eq!(second, vec![c]);
    }
}
