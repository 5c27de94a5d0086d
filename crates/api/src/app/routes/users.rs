use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use orgdesk_auth::Permission;
use orgdesk_core::UserId;
use orgdesk_services::CreateMemberInput;

use crate::app::{dto, errors, services::AppServices};
use crate::authz;
use crate::context::PrincipalContext;

/// GET /users - members of the caller's organization
pub async fn list_members(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ManageUsers) {
        return resp;
    }

    match services.members.list_members(principal.principal()).await {
        Ok(members) => (StatusCode::OK, Json(members)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// POST /users - create a member; answers with one-time credentials
pub async fn create_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<CreateMemberInput>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ManageUsers) {
        return resp;
    }
    let input = match dto::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .members
        .create_member(principal.principal(), input, Utc::now())
        .await
    {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// POST /users/:id/deactivate
pub async fn deactivate_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(services, principal, &id, false).await
}

/// POST /users/:id/activate
pub async fn activate_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(services, principal, &id, true).await
}

async fn set_active(
    services: Arc<AppServices>,
    principal: PrincipalContext,
    id: &str,
    active: bool,
) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ManageUsers) {
        return resp;
    }
    let id: UserId = match dto::parse_id(id, "user id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.members.set_active(principal.principal(), id, active).await {
        Ok(member) => (StatusCode::OK, Json(member)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
