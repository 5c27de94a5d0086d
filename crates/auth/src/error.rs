//! Authentication error types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token was presented.
    #[error("missing bearer token")]
    MissingToken,

    /// The token failed signature, format or time-window checks.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Unknown email or wrong password (deliberately indistinguishable).
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("cryptography error: {0}")]
    Crypto(String),
}
