use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use murmur_db::DbError;
use murmur_types::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Details are logged where the error is created, never sent to the client.
    #[error("internal server error")]
    Internal,
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(errors) => ApiError::Validation(errors),
            DbError::NotFound { entity, .. } => ApiError::NotFound(entity),
            other => {
                error!("Database error: {}", other);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match self {
            ApiError::Validation(errors) => json!({ "errors": errors }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_db_errors() {
        let validation = ApiError::from(DbError::from(ValidationErrors::single("email", "is invalid")));
        assert!(matches!(validation, ApiError::Validation(_)));

        let missing = ApiError::from(DbError::NotFound { entity: "user", id: 1 });
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let storage = ApiError::from(DbError::Other(anyhow::anyhow!("disk on fire")));
        assert_eq!(storage.to_string(), "internal server error");
    }
}
