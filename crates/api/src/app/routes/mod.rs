use axum::{
    Router,
    routing::{get, post},
};

pub mod admin;
pub mod auth;
pub mod events;
pub mod memos;
pub mod system;
pub mod users;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
}

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/users", users::router())
        .nest("/memos", memos::router())
        .nest("/events", events::router())
        .nest("/admin", admin::router())
}
