use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};

use backoffice_core::EventId;
use backoffice_planner::NewCalendarEvent;

use crate::app::dto::{EventListQuery, Items, owner_id};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/:id", delete(delete_event))
}

/// GET /events[?owner=&from=&to=] - ordered by start.
pub async fn list_events(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<EventListQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let window = query.window()?;
    let events = services
        .planner
        .list_events(&principal.principal(), owner_id(query.owner), window)?;
    Ok(Json(Items::new(events)))
}

pub async fn create_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewCalendarEvent>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;
    let event = services.planner.create_event(&principal.principal(), body)?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn delete_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: EventId = id.parse()?;
    services.planner.delete_event(&principal.principal(), id)?;
    Ok(StatusCode::NO_CONTENT)
}
