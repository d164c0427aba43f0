use serde::{Deserialize, Serialize};

use crate::models::User;

// -- JWT Claims --

/// JWT claims issued by `/auth/*` and checked by the auth middleware.
///
/// Carries no role: admin status is looked up on every admin action.
/// `name` is for client display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub name: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by both register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

// -- Users --

/// Partial update. A password is only validated (and re-hashed) when present.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetAdminRequest {
    pub admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: User,
    pub micropost_count: i64,
    pub following_count: i64,
    pub followers_count: i64,
}

// -- Microposts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMicropostRequest {
    pub content: String,
}

// -- Relationships --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FollowRequest {
    pub followed_id: i64,
}

// -- Pagination --

pub const DEFAULT_PER_PAGE: u32 = 30;
pub const MAX_PER_PAGE: u32 = 100;

/// `?page=&per_page=` query, 1-based.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageQuery {
    /// Clamped `(limit, offset)` pair for SQL.
    pub fn limit_offset(&self) -> (u32, u32) {
        let per_page = self.per_page.clamp(1, MAX_PER_PAGE);
        let page = self.page.max(1);
        (per_page, (page - 1).saturating_mul(per_page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_clamps() {
        assert_eq!(PageQuery::default().limit_offset(), (30, 0));
        assert_eq!(PageQuery { page: 0, per_page: 0 }.limit_offset(), (1, 0));
        assert_eq!(PageQuery { page: 3, per_page: 500 }.limit_offset(), (100, 200));
    }

    #[test]
    fn register_rejects_unknown_fields() {
        let body = r#"{"name":"a","email":"b","password":"c","password_confirmation":"c","admin":true}"#;
        assert!(serde_json::from_str::<RegisterRequest>(body).is_err());
    }
}
