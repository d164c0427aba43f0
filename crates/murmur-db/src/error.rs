use murmur_types::validation::ValidationErrors;
use thiserror::Error;

/// Errors surfaced by every `Database` operation.
#[derive(Debug, Error)]
pub enum DbError {
    /// One or more fields failed validation; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The addressed row does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

/// True for a UNIQUE constraint violation raised by SQLite.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
