use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use orgdesk_auth::Permission;
use orgdesk_core::RegistrationId;
use orgdesk_services::{SubmitRegistrationInput, UpdateStatusInput};

use crate::app::{dto, errors, services::AppServices};
use crate::authz;
use crate::context::PrincipalContext;

/// POST /registrations - public
pub async fn submit_registration(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<SubmitRegistrationInput>, JsonRejection>,
) -> axum::response::Response {
    let input = match dto::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.provisioner.submit_registration(input, Utc::now()).await {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// GET /registrations?status=PENDING
pub async fn list_registrations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::RegistrationListQuery>,
) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ManageRegistrations) {
        return resp;
    }

    match services.provisioner.list_registrations(query.status).await {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// GET /registrations/:id
pub async fn get_registration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ManageRegistrations) {
        return resp;
    }
    let id: RegistrationId = match dto::parse_id(&id, "registration id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.provisioner.get_registration(id).await {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// PATCH /registrations/:id/status
///
/// Approval answers with the administrator's one-time credentials.
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusInput>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ManageRegistrations) {
        return resp;
    }
    let id: RegistrationId = match dto::parse_id(&id, "registration id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let input = match dto::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .provisioner
        .update_request_status(id, input, principal.principal(), Utc::now())
        .await
    {
        Ok(update) => (StatusCode::OK, Json(update)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
