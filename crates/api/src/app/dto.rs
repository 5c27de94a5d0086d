use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use orgdesk_auth::Role;
use orgdesk_core::{OrganizationId, UserId};
use orgdesk_tenancy::RegistrationStatus;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegistrationListQuery {
    pub status: Option<RegistrationStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub permission: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmIResponse {
    pub user_id: UserId,
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
}

// -------------------------
// Mapping helpers
// -------------------------

/// Unwrap a JSON body, turning malformed JSON or unknown enum values into a
/// 400 `validation_error`.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    body.map(|Json(value)| value).map_err(|rejection| {
        errors::validation_error(rejection.body_text(), Default::default())
    })
}

/// Parse a path segment into a typed id.
pub fn parse_id<T: From<Uuid>>(raw: &str, what: &'static str) -> Result<T, axum::response::Response> {
    raw.parse::<Uuid>()
        .map(T::from)
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what}")))
}
