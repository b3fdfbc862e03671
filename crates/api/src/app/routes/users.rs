//! Self-service profile routes. The policy allows the user themself or a MASTER.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use backoffice_core::UserId;

use crate::app::dto::{OfficePhoneRequest, UpdateProfileRequest, UserView};
use crate::app::errors::ApiResult;
use crate::app::services::{AppServices, run_blocking};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/:id", get(get_user).patch(update_user))
        .route("/:id/office-phone", post(set_office_phone))
}

/// GET /users/:id
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id: UserId = id.parse()?;
    let user = services.accounts.get_profile(&principal.principal(), id)?;
    Ok(Json(UserView::from(user)))
}

/// PATCH /users/:id - phone numbers, birth date, password.
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id: UserId = id.parse()?;
    let Json(body) = payload?;
    let update = body.into_update()?;
    let caller = principal.principal();

    let user = if update.new_password.is_some() {
        run_blocking(move || services.accounts.update_profile(&caller, id, update, Utc::now())).await?
    } else {
        services.accounts.update_profile(&caller, id, update, Utc::now())?
    };
    Ok(Json(UserView::from(user)))
}

/// POST /users/:id/office-phone - set, or clear with `null`.
pub async fn set_office_phone(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<OfficePhoneRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id: UserId = id.parse()?;
    let Json(body) = payload?;

    let user = services
        .accounts
        .set_office_phone(&principal.principal(), id, body.into_phone(), Utc::now())?;
    Ok(Json(UserView::from(user)))
}
