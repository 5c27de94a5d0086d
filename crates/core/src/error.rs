//! Error type shared by the pure domain crates.

use thiserror::Error;

/// Rule violation raised by tenancy, invoicing or id parsing.
///
/// Carries no storage or transport detail; the service layer maps each kind
/// onto its own error taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed org code, email, tier or other caller input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The entity is not in a state that allows the change
    /// (paying an invoice that was never submitted, re-tiering a paid one).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The change already happened (approving a paid invoice).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_kind() {
        assert_eq!(
            DomainError::validation("org code too short").to_string(),
            "validation failed: org code too short"
        );
        assert_eq!(
            DomainError::conflict("invoice is already paid").to_string(),
            "conflict: invoice is already paid"
        );
    }
}
