use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use murmur_types::validation::ValidationErrors;

use crate::error::ApiError;

/// `Json` whose rejections use the same error bodies as every other failure.
///
/// A body that parses but has the wrong shape (missing or unknown field,
/// wrong type) is reported under the `body` key as a validation error.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::Validation(ValidationErrors::single(
                "body",
                data_error_message(&err.body_text()),
            )),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

/// Strip axum's generic prefix, keeping serde's own message.
fn data_error_message(text: &str) -> String {
    text.split_once(": ")
        .map_or(text, |(_, detail)| detail)
        .to_string()
}
