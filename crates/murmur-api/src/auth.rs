use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info, warn};

use murmur_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use murmur_types::models::User;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::{AppState, run_db};

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_db(&state, move |db| {
        db.register(&req.name, &req.email, &req.password, &req.password_confirmation)
    })
    .await
    .inspect_err(|e| {
        if let ApiError::Validation(errors) = e {
            warn!("Registration rejected: {}", errors);
        }
    })?;

    let token = issue_token(&state, &user)?;
    info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_db(&state, move |db| db.authenticate(&req.email, &req.password))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let token = issue_token(&state, &user)?;

    Ok(Json(AuthResponse { user, token }))
}

pub(crate) fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    create_token(&state.jwt_secret, state.token_ttl_days, user).map_err(|e| {
        error!("Token encoding failed: {}", e);
        ApiError::Internal
    })
}

fn create_token(secret: &str, ttl_days: i64, user: &User) -> anyhow::Result<String> {
    let expires_at = chrono::Duration::try_days(ttl_days)
        .filter(|ttl| *ttl > chrono::Duration::zero())
        .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| anyhow::anyhow!("token lifetime of {ttl_days} days is out of range"))?;

    let claims = Claims {
        sub: user.id,
        name: user.name.clone(),
        exp: usize::try_from(expires_at.timestamp())?,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
