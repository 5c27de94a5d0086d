use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use orgdesk_auth::Permission;
use orgdesk_core::InvoiceId;
use orgdesk_services::{SubmitPaymentInput, UpdateTierInput};

use crate::app::{dto, errors, services::AppServices};
use crate::authz;
use crate::context::PrincipalContext;

/// GET /invoices/current - outstanding invoice, a fresh one if the
/// subscription lapsed, else the latest paid one (or `null`).
pub async fn current_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ManageBilling) {
        return resp;
    }
    let organization_id = match authz::require_organization(&principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.billing.get_or_create_invoice(organization_id, Utc::now()).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// POST /invoices/:id/payment
pub async fn submit_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<SubmitPaymentInput>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ManageBilling) {
        return resp;
    }
    let organization_id = match authz::require_organization(&principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let id: InvoiceId = match dto::parse_id(&id, "invoice id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let input = match dto::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.billing.submit_payment(Some(organization_id), id, input).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// PATCH /invoices/:id/tier
pub async fn update_tier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateTierInput>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ManageBilling) {
        return resp;
    }
    let organization_id = match authz::require_organization(&principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let id: InvoiceId = match dto::parse_id(&id, "invoice id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let input = match dto::json_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.billing.update_invoice_tier(Some(organization_id), id, input).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// GET /admin/invoices - every organization's invoices, newest first
pub async fn list_all_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ApprovePayments) {
        return resp;
    }

    match services.billing.list_invoices(None).await {
        Ok(invoices) => (StatusCode::OK, Json(invoices)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// POST /admin/invoices/:id/approve
pub async fn approve_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::authorize_request(&principal, Permission::ApprovePayments) {
        return resp;
    }
    let id: InvoiceId = match dto::parse_id(&id, "invoice id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.billing.approve_invoice(id, Utc::now()).await {
        Ok(approved) => (StatusCode::OK, Json(approved)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
