//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: credential store, token codec and service construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: query/response DTOs and request mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use orgdesk_auth::JwtValidator;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let validator: Arc<dyn JwtValidator> = services.codec.clone();
    let auth_state = middleware::AuthState::new(validator);

    // Protected routes: require a valid bearer token.
    let protected = routes::protected().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public())
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
