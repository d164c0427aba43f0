pub mod auth;
pub mod error;
pub mod extract;
pub mod feed;
pub mod microposts;
pub mod middleware;
pub mod pages;
pub mod relationships;
pub mod router;
pub mod state;
pub mod users;

pub use router::router;
pub use state::{AppState, AppStateInner};
