//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, verifier, token codec and the services over them
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

use services::AppServices;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::ServiceInitError;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub async fn build_app(config: ApiConfig) -> Result<Router, ServiceInitError> {
    let services = tokio::task::spawn_blocking(move || services::build_services(&config))
        .await
        .map_err(|e| ServiceInitError::Join(e.to_string()))??;
    Ok(router(Arc::new(services)))
}

/// Router over already-built services.
pub fn router(services: Arc<AppServices>) -> Router {
    // Protected routes: require a verified bearer token.
    let protected = routes::router().route_layer(axum::middleware::from_fn_with_state(
        Arc::clone(&services),
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::log_requests))
                .layer(Extension(services)),
        )
}
