use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use murmur_types::api::Claims;

use crate::error::ApiError;
use crate::state::{AppState, run_db};

/// Validate the Bearer JWT and load the account it names into the request
/// as `Extension<User>`. A token for a deleted account gets 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    let id = token_data.claims.sub;
    let user = run_db(&state, move |db| db.get_user(id))
        .await?
        .ok_or_else(|| {
            debug!(user_id = id, "Token for a deleted account");
            ApiError::Unauthorized
        })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
