use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use backoffice_core::DomainError;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Verify the bearer token and attach the caller to the request.
///
/// Missing or unparseable tokens are 401; bad signatures and expired tokens 403.
pub async fn auth_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;
    let claims = services.accounts.authenticate(token, Utc::now())?;

    req.extensions_mut().insert(PrincipalContext::new(claims));
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, DomainError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(DomainError::Unauthenticated)?;

    let header = header.to_str().map_err(|_| DomainError::Unauthenticated)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(DomainError::Unauthenticated)?
        .trim();
    if token.is_empty() {
        return Err(DomainError::Unauthenticated);
    }

    Ok(token)
}

/// One log line per request.
pub async fn log_requests(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    response
}
