use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Claims of the current session, as the token carries them.
pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    let claims = principal.claims();
    Json(serde_json::json!({
        "id": claims.id,
        "email": claims.email,
        "name": claims.name,
        "role": claims.role,
        "role_label": claims.role.label(),
        "team": claims.team,
        "department": claims.department,
        "level": claims.level,
        "expires_at": claims.expires_at(),
    }))
}
