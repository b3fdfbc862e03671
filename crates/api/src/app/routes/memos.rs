use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::Utc;

use backoffice_core::MemoId;

use crate::app::dto::{Items, MemoRequest, OwnerQuery, owner_id};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_memos).post(create_memo))
        .route("/:id", patch(edit_memo).delete(delete_memo))
}

/// GET /memos[?owner=] - newest first.
pub async fn list_memos(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let memos = services
        .planner
        .list_memos(&principal.principal(), owner_id(query.owner))?;
    Ok(Json(Items::new(memos)))
}

pub async fn create_memo(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<MemoRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;
    let memo = services
        .planner
        .create_memo(&principal.principal(), &body.content, Utc::now())?;
    Ok((StatusCode::CREATED, Json(memo)))
}

pub async fn edit_memo(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<MemoRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id: MemoId = id.parse()?;
    let Json(body) = payload?;
    let memo = services
        .planner
        .edit_memo(&principal.principal(), id, &body.content, Utc::now())?;
    Ok(Json(memo))
}

pub async fn delete_memo(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: MemoId = id.parse()?;
    services.planner.delete_memo(&principal.principal(), id)?;
    Ok(StatusCode::NO_CONTENT)
}
