//! Admin routes: approval queue, user table, role/status/level management.
//!
//! Thresholds live in the policy table (`Operation::requirement`); handlers
//! only parse input and hand the caller to the account service.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Serialize;

use backoffice_auth::{Operation, Role, UserStatus, explain};
use backoffice_core::UserId;
use backoffice_infra::UserFilter;

use crate::app::dto::{
    ExplainQuery, Items, OptionView, SetLevelRequest, SetRoleRequest, SetStatusRequest, UserView, owner_id,
};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/pending", get(list_pending))
        .route("/users/:id/approve", post(approve_user))
        .route("/users/:id/reject", post(reject_user))
        .route("/users/:id/status", put(set_status))
        .route("/users/:id/role", put(set_role))
        .route("/users/:id/level", put(set_level))
        .route("/options", get(options))
        .route("/authz/explain", get(explain_authorization))
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

/// GET /admin/users?status=&role=&team=&department=&q=
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    filter: Result<Query<UserFilter>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(filter) = filter?;
    let users = services.accounts.list_users(&principal.principal(), &filter)?;
    Ok(Json(Items::new(users.iter().map(UserView::from).collect())))
}

/// GET /admin/users/pending
pub async fn list_pending(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult<impl IntoResponse> {
    let users = services.accounts.list_pending(&principal.principal())?;
    Ok(Json(Items::new(users.iter().map(UserView::from).collect())))
}

#[derive(Debug, Serialize)]
struct TeamOption<'a> {
    team: &'a str,
    department: &'a str,
}

/// GET /admin/options - the option sets the admin screens render.
pub async fn options(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    let directory = services.accounts.directory();
    let roles: Vec<OptionView> = Role::ALL
        .into_iter()
        .map(|r| OptionView {
            value: r.as_str(),
            label: r.label(),
        })
        .collect();
    let statuses: Vec<&str> = UserStatus::ALL.iter().map(UserStatus::as_str).collect();
    let teams: Vec<TeamOption<'_>> = directory
        .teams()
        .map(|(team, department)| TeamOption { team, department })
        .collect();

    Json(serde_json::json!({
        "roles": roles,
        "statuses": statuses,
        "teams": teams,
        "levels": directory.levels(),
    }))
}

/// GET /admin/authz/explain?operation=&target= - would the caller be allowed?
pub async fn explain_authorization(
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<ExplainQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let operation: Operation = query.operation.parse()?;
    Ok(Json(explain(&principal.principal(), operation, owner_id(query.target))))
}

// ─────────────────────────────────────────────────────────────────────────────
// Transitions
// ─────────────────────────────────────────────────────────────────────────────

/// POST /admin/users/:id/approve
pub async fn approve_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id: UserId = id.parse()?;
    let user = services.accounts.approve(&principal.principal(), id, Utc::now())?;
    Ok(Json(UserView::from(user)))
}

/// POST /admin/users/:id/reject
pub async fn reject_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id: UserId = id.parse()?;
    let user = services.accounts.reject(&principal.principal(), id, Utc::now())?;
    Ok(Json(UserView::from(user)))
}

/// PUT /admin/users/:id/status
pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<SetStatusRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id: UserId = id.parse()?;
    let Json(body) = payload?;

    let user = services
        .accounts
        .set_status(&principal.principal(), id, &body.status, Utc::now())?;
    Ok(Json(UserView::from(user)))
}

/// PUT /admin/users/:id/role
pub async fn set_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<SetRoleRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id: UserId = id.parse()?;
    let Json(body) = payload?;

    let user = services
        .accounts
        .set_role(&principal.principal(), id, &body.role, Utc::now())?;
    Ok(Json(UserView::from(user)))
}

/// PUT /admin/users/:id/level
pub async fn set_level(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<SetLevelRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id: UserId = id.parse()?;
    let Json(body) = payload?;

    let user = services
        .accounts
        .set_level(&principal.principal(), id, &body.level, Utc::now())?;
    Ok(Json(UserView::from(user)))
}
