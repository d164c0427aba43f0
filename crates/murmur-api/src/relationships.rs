use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use murmur_types::api::FollowRequest;
use murmur_types::models::User;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::{AppState, run_db};

/// POST /relationships — follow. Repeating it is harmless.
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    ApiJson(req): ApiJson<FollowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    run_db(&state, move |db| db.follow(actor.id, req.followed_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /relationships/{followed_id} — unfollow; no-op when not following.
pub async fn destroy(
    State(state): State<AppState>,
    Path(followed_id): Path<i64>,
    Extension(actor): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    run_db(&state, move |db| db.unfollow(actor.id, followed_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
