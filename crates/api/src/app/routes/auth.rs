use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use orgdesk_services::{LoginInput, RegisterApplicantInput};

use crate::app::{dto, errors, services::AppServices};

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> axum::response::Response {
    let input = match dto::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.auth.login(input, Utc::now()).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// POST /auth/register - public self-registration as APPLICANT
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<RegisterApplicantInput>, JsonRejection>,
) -> axum::response::Response {
    let input = match dto::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.auth.register_applicant(input, Utc::now()).await {
        Ok(profile) => (StatusCode::CREATED, Json(profile)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
