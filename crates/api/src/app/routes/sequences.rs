use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use orgdesk_auth::Permission;
use orgdesk_infra::IdentifierKind;

use crate::app::{errors, services::AppServices};
use crate::authz;
use crate::context::PrincipalContext;

/// Permission needed to mint numbers of `kind`.
pub fn required_permission(kind: IdentifierKind) -> Permission {
    match kind {
        IdentifierKind::Letter => Permission::ManageLetters,
        IdentifierKind::Admission => Permission::ManageStudents,
        IdentifierKind::Invoice => Permission::ManageBilling,
    }
}

/// POST /sequences/:kind - mint the next identifier for the caller's organization
pub async fn issue_identifier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(kind): Path<String>,
) -> axum::response::Response {
    let kind: IdentifierKind = match kind.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_kind",
                "kind must be one of: letter, invoice, admission",
            );
        }
    };
    if let Err(resp) = authz::authorize_request(&principal, required_permission(kind)) {
        return resp;
    }

    match services
        .numbering
        .issue(principal.organization_id(), kind, Utc::now())
        .await
    {
        Ok(issued) => (StatusCode::CREATED, Json(issued)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
