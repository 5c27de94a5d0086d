use axum::{
    Router,
    routing::{get, patch, post},
};

pub mod auth;
pub mod invoices;
pub mod rbac;
pub mod registrations;
pub mod sequences;
pub mod system;
pub mod users;

/// Endpoints reachable without a token.
pub fn public() -> Router {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/registrations", post(registrations::submit_registration))
}

/// Endpoints behind the auth middleware.
pub fn protected() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/registrations", get(registrations::list_registrations))
        .route("/registrations/:id", get(registrations::get_registration))
        .route("/registrations/:id/status", patch(registrations::update_status))
        .route("/invoices/current", get(invoices::current_invoice))
        .route("/invoices/:id/payment", post(invoices::submit_payment))
        .route("/invoices/:id/tier", patch(invoices::update_tier))
        .route("/admin/invoices", get(invoices::list_all_invoices))
        .route("/admin/invoices/:id/approve", post(invoices::approve_invoice))
        .route("/sequences/:kind", post(sequences::issue_identifier))
        .route("/users", get(users::list_members).post(users::create_member))
        .route("/users/:id/deactivate", post(users::deactivate_member))
        .route("/users/:id/activate", post(users::activate_member))
        .nest("/rbac", rbac::router())
}
