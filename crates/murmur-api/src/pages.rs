use axum::{
    Json,
    extract::State,
    response::{Html, IntoResponse},
};
use serde_json::json;

use crate::state::AppState;

/// "<base> | <page>", or just the base when there is no page title.
pub fn full_title(base: &str, page: Option<&str>) -> String {
    match page {
        Some(page) if !page.is_empty() => format!("{base} | {page}"),
        _ => base.to_string(),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn render(state: &AppState, page: &str, body: &str) -> Html<String> {
    let title = escape_html(&full_title(&state.site_title, Some(page)));
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{title}</title></head>\n<body>\n<h1>{page}</h1>\n{body}\n</body>\n</html>\n"
    ))
}

pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    render(&state, "Home", "<p><a href=\"/signup\">Sign up now!</a></p>")
}

pub async fn contact(State(state): State<AppState>) -> impl IntoResponse {
    render(&state, "Contact", "<p>Get in touch.</p>")
}

pub async fn about(State(state): State<AppState>) -> impl IntoResponse {
    render(&state, "About", "<p>A small place for short posts.</p>")
}

pub async fn help(State(state): State<AppState>) -> impl IntoResponse {
    render(&state, "Help", "<p>Post, follow, read your feed.</p>")
}

pub async fn signup(State(state): State<AppState>) -> impl IntoResponse {
    render(&state, "Sign up", "<p>POST /auth/register to create an account.</p>")
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
