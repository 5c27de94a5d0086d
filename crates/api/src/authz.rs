//! API-side permission gate.
//!
//! Handlers call [`authorize_request`] before touching any service, so a
//! denied caller never reaches storage.

use axum::http::StatusCode;
use axum::response::Response;
use tracing::info;

use orgdesk_auth::{Permission, authorize};
use orgdesk_core::OrganizationId;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Check `permission` for the current caller; a denial is a ready 403.
pub fn authorize_request(principal: &PrincipalContext, permission: Permission) -> Result<(), Response> {
    authorize(principal.principal(), permission).map_err(|err| {
        info!(user_id = %principal.user_id(), role = %principal.role(), %permission, "permission denied");
        json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
    })
}

/// Organization the caller acts in; callers without one get a 403.
pub fn require_organization(principal: &PrincipalContext) -> Result<OrganizationId, Response> {
    principal.organization_id().ok_or_else(|| {
        json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "caller does not belong to an organization",
        )
    })
}
