use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use orgdesk_auth::AuthError;
use orgdesk_services::ServiceError;

/// Map a service failure to its HTTP status and stable error code.
pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Authentication(auth) => match auth {
            AuthError::MissingToken => json_error(StatusCode::UNAUTHORIZED, "missing_token", auth.to_string()),
            AuthError::InvalidToken(_) => json_error(StatusCode::UNAUTHORIZED, "invalid_token", auth.to_string()),
            AuthError::InvalidCredentials => {
                json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", auth.to_string())
            }
            AuthError::AccountDisabled => json_error(StatusCode::FORBIDDEN, "account_disabled", auth.to_string()),
            AuthError::Crypto(msg) => internal_error(msg),
        },
        ServiceError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        ServiceError::Validation { message, fields } => validation_error(message, fields),
        err @ ServiceError::DuplicateRegistration(_) => {
            json_error(StatusCode::BAD_REQUEST, "duplicate_registration", err.to_string())
        }
        ServiceError::DuplicateOrganization(msg) => json_error(StatusCode::CONFLICT, "duplicate_organization", msg),
        ServiceError::DuplicateUser(msg) => json_error(StatusCode::CONFLICT, "duplicate_user", msg),
        err @ ServiceError::AlreadyApproved => json_error(StatusCode::CONFLICT, "already_approved", err.to_string()),
        err @ ServiceError::InvalidTransition(_) => {
            json_error(StatusCode::CONFLICT, "invalid_transition", err.to_string())
        }
        ServiceError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        err @ ServiceError::Collision(_) => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        err @ ServiceError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        ServiceError::Transaction(msg) => internal_error(msg),
    }
}

fn internal_error(detail: String) -> axum::response::Response {
    error!(%detail, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "transaction_failed", detail)
}

pub fn validation_error(
    message: impl Into<String>,
    fields: BTreeMap<String, Vec<String>>,
) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "message": message.into(),
            "fields": fields,
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
