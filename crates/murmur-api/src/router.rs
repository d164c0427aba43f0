use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, feed, microposts, pages, relationships, users};

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(pages::home))
        .route("/contact", get(pages::contact))
        .route("/about", get(pages::about))
        .route("/help", get(pages::help))
        .route("/signup", get(pages::signup))
        .route("/health", get(pages::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/users", get(users::index))
        .route(
            "/users/{id}",
            get(users::show).patch(users::update).delete(users::destroy),
        )
        .route("/users/{id}/admin", put(users::set_admin))
        .route("/users/{id}/microposts", get(users::microposts))
        .route("/users/{id}/following", get(users::following))
        .route("/users/{id}/followers", get(users::followers))
        .route("/microposts", post(microposts::create))
        .route("/microposts/{id}", delete(microposts::destroy))
        .route("/relationships", post(relationships::create))
        .route("/relationships/{followed_id}", delete(relationships::destroy))
        .route("/feed", get(feed::feed))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
