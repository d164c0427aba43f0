use tracing::debug;

use murmur_types::models::User;

use crate::users::NewUser;
use crate::{Database, Result};

impl Database {
    /// Create an account from a plaintext password and its confirmation.
    /// Only the Argon2 hash and its salt are stored.
    pub fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<User> {
        self.create_user(NewUser {
            name,
            email,
            password,
            password_confirmation,
        })
    }

    /// `Ok(None)` for an unknown email or a wrong password; errors are
    /// reserved for storage failures.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(row) = self.get_user_row_by_email(email)? else {
            debug!("Authentication failed: unknown email");
            return Ok(None);
        };

        if !self.hasher().verify(password, &row.encrypted_password) {
            debug!(user_id = row.id, "Authentication failed: password mismatch");
            return Ok(None);
        }

        Ok(Some(row.into()))
    }

    /// Whether `password` matches the stored hash for `user`.
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        Ok(self
            .get_user_row(user.id)?
            .is_some_and(|row| self.hasher().verify(password, &row.encrypted_password)))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{db, user};

    #[test]
    fn stores_hash_and_salt_not_plaintext() {
        let db = db();
        let created = user(&db, "Example User", "user@example.com");
        let row = db.get_user_row(created.id).unwrap().unwrap();

        assert!(!row.encrypted_password.is_empty());
        assert!(!row.salt.is_empty());
        assert_ne!(row.encrypted_password, "foobar");
        assert!(row.encrypted_password.contains(&row.salt));
    }

    #[test]
    fn verify_password_matches_only_the_right_one() {
        let db = db();
        let created = user(&db, "Example User", "user@example.com");
        assert!(db.verify_password(&created, "foobar").unwrap());
        assert!(!db.verify_password(&created, "invalid").unwrap());
    }

    #[test]
    fn authenticate_wrong_password_is_none() {
        let db = db();
        user(&db, "Example User", "user@example.com");
        assert_eq!(db.authenticate("user@example.com", "wrongpass").unwrap(), None);
    }

    #[test]
    fn authenticate_unknown_email_is_none() {
        let db = db();
        user(&db, "Example User", "user@example.com");
        assert_eq!(db.authenticate("bar@foo.com", "foobar").unwrap(), None);
    }

    #[test]
    fn authenticate_returns_the_user() {
        let db = db();
        let created = user(&db, "Example User", "user@example.com");
        assert_eq!(
            db.authenticate("user@example.com", "foobar").unwrap(),
            Some(created.clone())
        );
        assert_eq!(
            db.authenticate("USER@EXAMPLE.COM", "foobar").unwrap(),
            Some(created)
        );
    }

    #[test]
    fn register_enforces_password_policy() {
        let db = db();
        assert!(db.register("Example User", "a@example.com", "", "").is_err());
        assert!(db.register("Example User", "ws@example.com", "      ", "      ").is_err());
        assert!(db.register("Example User", "b@example.com", "foobar", "invalid").is_err());
        assert!(db.register("Example User", "c@example.com", "aaaaa", "aaaaa").is_err());
        let long = "a".repeat(41);
        assert!(db.register("Example User", "d@example.com", &long, &long).is_err());
        let max = "a".repeat(40);
        assert!(db.register("Example User", "e@example.com", &max, &max).is_ok());
        assert!(db.register("Example User", "f@example.com", "aaaaaa", "aaaaaa").is_ok());
    }
}
