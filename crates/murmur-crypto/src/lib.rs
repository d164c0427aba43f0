/// Murmur Crypto Library
///
/// Password storage only: Argon2id digests with a random per-user salt.
/// Plaintext passwords are never persisted or logged.

pub mod password;
