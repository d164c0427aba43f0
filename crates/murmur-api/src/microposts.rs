use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use murmur_types::api::CreateMicropostRequest;
use murmur_types::models::User;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::{AppState, run_db};

/// POST /microposts
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    ApiJson(req): ApiJson<CreateMicropostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = run_db(&state, move |db| db.create_micropost(actor.id, &req.content)).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// DELETE /microposts/{id} — the author, or an admin.
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(actor): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let post = run_db(&state, move |db| db.get_micropost(id))
        .await?
        .ok_or(ApiError::NotFound("micropost"))?;

    if post.user_id != actor.id && !actor.admin {
        return Err(ApiError::Forbidden);
    }

    run_db(&state, move |db| db.destroy_micropost(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
