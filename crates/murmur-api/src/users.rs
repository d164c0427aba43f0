use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use murmur_db::{Database, DbError, users::UserChanges};
use murmur_types::api::{PageQuery, SetAdminRequest, UpdateUserRequest, UserProfile};
use murmur_types::models::User;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::{AppState, run_db};

/// The caller's admin flag as loaded by the auth layer, not the token.
fn require_admin(actor: &User) -> Result<(), ApiError> {
    if !actor.admin {
        warn!(user_id = actor.id, "Admin action refused");
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

fn existing_user(db: &Database, id: i64) -> murmur_db::Result<User> {
    db.get_user(id)?.ok_or(DbError::NotFound { entity: "user", id })
}

/// GET /users
pub async fn index(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = run_db(&state, move |db| db.list_users(page)).await?;
    Ok(Json(users))
}

/// GET /users/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = run_db(&state, move |db| {
        Ok(UserProfile {
            user: existing_user(db, id)?,
            micropost_count: db.count_microposts(id)?,
            following_count: db.following_count(id)?,
            followers_count: db.followers_count(id)?,
        })
    })
    .await?;

    Ok(Json(profile))
}

/// PATCH /users/{id} — only the account owner.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(actor): Extension<User>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if actor.id != id {
        return Err(ApiError::Forbidden);
    }

    let changes = UserChanges {
        name: req.name,
        email: req.email,
        password: req.password,
        password_confirmation: req.password_confirmation,
    };
    let user = run_db(&state, move |db| db.update_user(id, changes)).await?;

    Ok(Json(user))
}

/// DELETE /users/{id} — admins only, and never their own account.
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(actor): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&actor)?;
    if actor.id == id {
        return Err(ApiError::Forbidden);
    }

    run_db(&state, move |db| db.destroy_user(id)).await?;
    info!(user_id = id, admin_id = actor.id, "User removed by admin");

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /users/{id}/admin — admins only.
pub async fn set_admin(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(actor): Extension<User>,
    ApiJson(req): ApiJson<SetAdminRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&actor)?;
    let user = run_db(&state, move |db| db.set_admin(id, req.admin)).await?;
    Ok(Json(user))
}

/// GET /users/{id}/microposts
pub async fn microposts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = run_db(&state, move |db| {
        existing_user(db, id)?;
        db.user_microposts(id, page)
    })
    .await?;
    Ok(Json(posts))
}

/// GET /users/{id}/following
pub async fn following(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let users = run_db(&state, move |db| {
        existing_user(db, id)?;
        db.following(id)
    })
    .await?;
    Ok(Json(users))
}

/// GET /users/{id}/followers
pub async fn followers(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let users = run_db(&state, move |db| {
        existing_user(db, id)?;
        db.followers(id)
    })
    .await?;
    Ok(Json(users))
}
