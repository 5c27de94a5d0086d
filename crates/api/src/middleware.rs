use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use orgdesk_auth::{AuthError, Authenticator, JwtValidator};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Arc<Authenticator<dyn JwtValidator>>,
}

impl AuthState {
    pub fn new(validator: Arc<dyn JwtValidator>) -> Self {
        Self {
            authenticator: Arc::new(Authenticator::new(validator)),
        }
    }
}

/// Resolve the bearer token into a [`PrincipalContext`] or answer 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.authenticator.authenticate(header, Utc::now()) {
        Ok(principal) => {
            req.extensions_mut().insert(PrincipalContext::new(principal));
            next.run(req).await
        }
        Err(AuthError::MissingToken) => json_error(
            StatusCode::UNAUTHORIZED,
            "missing_token",
            "missing bearer token",
        ),
        Err(err) => {
            debug!(error = %err, "rejected bearer token");
            json_error(StatusCode::UNAUTHORIZED, "invalid_token", err.to_string())
        }
    }
}
