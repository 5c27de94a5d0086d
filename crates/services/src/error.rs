//! Service-layer error model.
//!
//! Every domain, auth and storage error funnels into [`ServiceError`]; the API
//! maps each kind to one HTTP status.

use std::collections::BTreeMap;

use thiserror::Error;

use orgdesk_auth::{AuthError, AuthzError};
use orgdesk_core::DomainError;
use orgdesk_infra::{StoreError, UniqueConstraint};
use orgdesk_tenancy::RegistrationError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Authentication(AuthError),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("validation failed: {message}")]
    Validation {
        message: String,
        /// Field name → messages.
        fields: BTreeMap<String, Vec<String>>,
    },

    #[error("registration rejected: {0}")]
    DuplicateRegistration(String),

    #[error("{0}")]
    DuplicateOrganization(String),

    #[error("{0}")]
    DuplicateUser(String),

    #[error("registration request is already approved")]
    AlreadyApproved,

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// A concurrent writer claimed the same unique key; retrying may succeed.
    #[error("concurrent write collided on {0}")]
    Collision(UniqueConstraint),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Storage failure; the transaction was rolled back.
    #[error("transaction failed: {0}")]
    Transaction(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), vec![message.clone()]);
        Self::Validation { message, fields }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(UniqueConstraint::OrganizationCode) => {
                ServiceError::DuplicateOrganization("organization code is already in use".to_string())
            }
            StoreError::UniqueViolation(UniqueConstraint::UserEmail) => {
                ServiceError::DuplicateUser("email is already registered".to_string())
            }
            StoreError::UniqueViolation(
                c @ (UniqueConstraint::Identifier
                | UniqueConstraint::InvoiceNumber
                | UniqueConstraint::OutstandingInvoice),
            ) => ServiceError::Collision(c),
            StoreError::UniqueViolation(other) => ServiceError::Conflict(other.to_string()),
            StoreError::NotFound => ServiceError::NotFound("record"),
            StoreError::Backend(msg) => ServiceError::Transaction(msg),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ServiceError::validation(msg),
            DomainError::InvariantViolation(msg) | DomainError::Conflict(msg) => {
                ServiceError::Conflict(msg)
            }
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Crypto(msg) => ServiceError::Transaction(msg),
            other => ServiceError::Authentication(other),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        ServiceError::Forbidden(err.to_string())
    }
}

impl From<RegistrationError> for ServiceError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::AlreadyApproved => ServiceError::AlreadyApproved,
            other @ RegistrationError::InvalidTransition { .. } => {
                ServiceError::InvalidTransition(other.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(msg) => msg.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        ServiceError::Validation {
            message: "request body failed validation".to_string(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_unique_violations_map_to_duplicates() {
        assert!(matches!(
            ServiceError::from(StoreError::UniqueViolation(UniqueConstraint::OrganizationCode)),
            ServiceError::DuplicateOrganization(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::UniqueViolation(UniqueConstraint::UserEmail)),
            ServiceError::DuplicateUser(_)
        ));
        assert_eq!(
            ServiceError::from(StoreError::UniqueViolation(UniqueConstraint::Identifier)),
            ServiceError::Collision(UniqueConstraint::Identifier)
        );
    }

    #[test]
    fn backend_failures_keep_their_message() {
        assert_eq!(
            ServiceError::from(StoreError::backend("connection reset")),
            ServiceError::Transaction("connection reset".to_string())
        );
    }

    #[test]
    fn crypto_failures_are_not_authentication_errors() {
        assert!(matches!(
            ServiceError::from(AuthError::Crypto("bad hash".into())),
            ServiceError::Transaction(_)
        ));
        assert_eq!(
            ServiceError::from(AuthError::InvalidCredentials),
            ServiceError::Authentication(AuthError::InvalidCredentials)
        );
    }
}
