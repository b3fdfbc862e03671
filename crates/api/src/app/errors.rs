//! Error-to-response mapping. Every failure leaves the API as
//! `{"error": <code>, "message": <text>}`.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use backoffice_auth::AuthzError;
use backoffice_core::DomainError;

/// Handler error: a domain error on its way out as HTTP.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        Self(value)
    }
}

impl From<AuthzError> for ApiError {
    fn from(value: AuthzError) -> Self {
        Self(value.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self(DomainError::validation(value.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self(DomainError::validation(value.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        Self(DomainError::validation(value.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        domain_error_to_response(self.0)
    }
}

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Unauthenticated | DomainError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        DomainError::InvalidToken(_)
        | DomainError::Forbidden(_)
        | DomainError::AccountPending
        | DomainError::AccountSuspended => StatusCode::FORBIDDEN,
        DomainError::Validation(_)
        | DomainError::DuplicateEmail(_)
        | DomainError::InvalidOption { .. }
        | DomainError::AlreadyProcessed(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
        // Infrastructure details stay in the log.
        return json_error(status, err.code(), "internal error");
    }
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (DomainError::Unauthenticated, 401),
            (DomainError::invalid_token("expired"), 403),
            (DomainError::forbidden("no"), 403),
            (DomainError::validation("bad"), 400),
            (DomainError::duplicate_email("a@x.com"), 400),
            (DomainError::InvalidCredentials, 401),
            (DomainError::AccountPending, 403),
            (DomainError::AccountSuspended, 403),
            (DomainError::already_processed("ACTIVE"), 400),
            (DomainError::conflict("version 3"), 409),
            (DomainError::invalid_option("role", "CEO"), 400),
            (DomainError::NotFound, 404),
            (DomainError::store("disk"), 500),
        ];
        for (err, code) in cases {
            assert_eq!(status_for(&err).as_u16(), code, "{err:?}");
        }
    }
}
