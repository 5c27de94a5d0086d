//! RBAC inspection endpoints.
//!
//! Visibility into roles, permissions and individual decisions, to answer
//! "why was this request denied?".

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use orgdesk_auth::{Permission, RbacRegistry, Role, explain_authorization};

use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/roles/:name", get(get_role))
        .route("/permissions", get(list_permissions))
        .route("/explain", get(explain_decision))
}

/// GET /rbac/roles - every role with its permissions
pub async fn list_roles(Extension(principal): Extension<PrincipalContext>) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ViewRoles) {
        return resp;
    }

    let registry = RbacRegistry::build();
    (StatusCode::OK, Json(json!({ "roles": registry.roles }))).into_response()
}

/// GET /rbac/roles/:name
pub async fn get_role(
    Extension(principal): Extension<PrincipalContext>,
    Path(name): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ViewRoles) {
        return resp;
    }

    let registry = RbacRegistry::build();
    match name.parse::<Role>().ok().and_then(|role| registry.role(role)) {
        Some(role) => (StatusCode::OK, Json(json!({ "role": role }))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "role not found"),
    }
}

/// GET /rbac/permissions
pub async fn list_permissions(Extension(principal): Extension<PrincipalContext>) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ViewRoles) {
        return resp;
    }

    let registry = RbacRegistry::build();
    (StatusCode::OK, Json(json!({ "permissions": registry.permissions }))).into_response()
}

/// GET /rbac/explain?permission=X - any caller may ask about themselves
pub async fn explain_decision(
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ExplainQuery>,
) -> axum::response::Response {
    let permission: Permission = match query.permission.parse() {
        Ok(p) => p,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "unknown_permission", e.to_string());
        }
    };

    let explanation = explain_authorization(principal.principal(), permission);
    (StatusCode::OK, Json(json!({ "explanation": explanation }))).into_response()
}
