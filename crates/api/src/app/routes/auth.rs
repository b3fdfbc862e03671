//! Signup and login. Both hash or compare passwords, so the service call runs
//! on the blocking pool.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use backoffice_auth::SignupForm;

use crate::app::dto::{LoginRequest, LoginResponse, SignupRequest, UserView};
use crate::app::errors::ApiResult;
use crate::app::services::{AppServices, run_blocking};

/// POST /signup - register; the account waits in PENDING for approval.
pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;
    let form = SignupForm::from(body);

    let user = run_blocking(move || services.accounts.signup(&form)).await?;
    Ok((StatusCode::CREATED, Json(UserView::from(user))))
}

/// POST /login - exchange credentials for a bearer token.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;

    let session = run_blocking(move || services.accounts.login(&body.email, &body.password, Utc::now())).await?;
    Ok(Json(LoginResponse::from(session)))
}
