use anyhow::{Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};

/// What gets stored for a password: the PHC-encoded hash and the salt it was derived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    pub hash: String,
    pub salt: String,
}

/// Argon2id hasher. Cheap to clone; share one per database.
#[derive(Clone)]
pub struct Hasher {
    argon2: Argon2<'static>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl Hasher {
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Minimal-cost parameters for tests and throwaway databases.
    pub fn fast() -> Self {
        Self::new(Params::new(Params::MIN_M_COST, 1, 1, None).unwrap_or_default())
    }

    /// Hash `plaintext` under a freshly generated salt.
    pub fn hash(&self, plaintext: &str) -> Result<PasswordDigest> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.hash_with_salt(plaintext, &salt)?;
        Ok(PasswordDigest {
            hash,
            salt: salt.as_str().to_string(),
        })
    }

    /// Deterministic: the same salt and plaintext always give the same hash.
    pub fn hash_with_salt(&self, plaintext: &str, salt: &SaltString) -> Result<String> {
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), salt)
            .map_err(|e| anyhow!("Password hashing failed: {}", e))?;
        Ok(hash.to_string())
    }

    /// True when `plaintext` produced `hash`. A malformed stored hash never matches.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
