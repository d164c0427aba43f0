use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};

use murmur_types::api::PageQuery;
use murmur_types::models::User;

use crate::error::ApiError;
use crate::state::{AppState, run_db};

/// GET /feed — the caller's own microposts and those of everyone they follow.
pub async fn feed(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = run_db(&state, move |db| db.feed(actor.id, page)).await?;
    Ok(Json(posts))
}
