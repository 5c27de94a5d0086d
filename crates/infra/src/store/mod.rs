//! Transactional persistence for tenants, accounts, registrations, invoices and
//! sequence counters.
//!
//! All writes go through a [`StoreTx`] obtained from a [`CredentialStore`].
//! Nothing written inside a transaction is visible to other callers until
//! [`StoreTx::commit`]; dropping an uncommitted transaction discards it.
//!
//! ## Implementations
//!
//! - [`InMemoryCredentialStore`]: dev/test, transactions serialized by an async mutex
//! - [`PgCredentialStore`]: Postgres via `sqlx`, unique constraints enforced by the schema

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use orgdesk_core::{InvoiceId, OrganizationId, RegistrationId, UserId};
use orgdesk_invoicing::Invoice;
use orgdesk_tenancy::{
    Organization, RegistrationRequest, RegistrationStatus, SchoolProfile, UserAccount,
};

use crate::sequence::{IdentifierKind, SequenceScope};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryCredentialStore, StoreCounts};
pub use postgres::PgCredentialStore;

/// Storage-level uniqueness guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueConstraint {
    OrganizationCode,
    UserEmail,
    InvoiceNumber,
    /// At most one UNPAID/PENDING invoice per organization.
    OutstandingInvoice,
    /// Issued identifier ledger, unique per kind.
    Identifier,
    SchoolProfile,
    Other(String),
}

impl core::fmt::Display for UniqueConstraint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UniqueConstraint::OrganizationCode => f.write_str("organization code"),
            UniqueConstraint::UserEmail => f.write_str("user email"),
            UniqueConstraint::InvoiceNumber => f.write_str("invoice number"),
            UniqueConstraint::OutstandingInvoice => f.write_str("outstanding invoice"),
            UniqueConstraint::Identifier => f.write_str("issued identifier"),
            UniqueConstraint::SchoolProfile => f.write_str("school profile"),
            UniqueConstraint::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(UniqueConstraint),

    #[error("record not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Whether retrying the whole transaction may succeed (number collisions).
    pub fn is_retryable_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::UniqueViolation(UniqueConstraint::Identifier)
                | StoreError::UniqueViolation(UniqueConstraint::InvoiceNumber)
        )
    }
}

/// Entry point of the store: hands out transactions.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;
}

/// One open transaction.
///
/// `update_*` methods return [`StoreError::NotFound`] when the row is missing;
/// `insert_*` methods return [`StoreError::UniqueViolation`] on conflicts.
#[async_trait]
pub trait StoreTx: Send {
    // Organizations
    async fn find_organization(&mut self, id: OrganizationId) -> Result<Option<Organization>, StoreError>;
    async fn find_organization_by_code(&mut self, code: &str) -> Result<Option<Organization>, StoreError>;
    async fn insert_organization(&mut self, org: &Organization) -> Result<(), StoreError>;
    async fn update_organization(&mut self, org: &Organization) -> Result<(), StoreError>;
    async fn insert_school_profile(&mut self, profile: &SchoolProfile) -> Result<(), StoreError>;

    // Users
    async fn find_user(&mut self, id: UserId) -> Result<Option<UserAccount>, StoreError>;
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<UserAccount>, StoreError>;
    async fn insert_user(&mut self, user: &UserAccount) -> Result<(), StoreError>;
    async fn update_user(&mut self, user: &UserAccount) -> Result<(), StoreError>;
    async fn list_users(&mut self, organization_id: OrganizationId) -> Result<Vec<UserAccount>, StoreError>;

    // Registration requests
    async fn find_registration(&mut self, id: RegistrationId) -> Result<Option<RegistrationRequest>, StoreError>;
    /// A PENDING/REVIEWING request using `code` or `email`.
    async fn find_open_registration(
        &mut self,
        code: &str,
        email: &str,
    ) -> Result<Option<RegistrationRequest>, StoreError>;
    async fn insert_registration(&mut self, request: &RegistrationRequest) -> Result<(), StoreError>;
    async fn update_registration(&mut self, request: &RegistrationRequest) -> Result<(), StoreError>;
    async fn list_registrations(
        &mut self,
        status: Option<RegistrationStatus>,
    ) -> Result<Vec<RegistrationRequest>, StoreError>;

    // Invoices
    async fn find_invoice(&mut self, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;
    async fn find_outstanding_invoice(&mut self, organization_id: OrganizationId) -> Result<Option<Invoice>, StoreError>;
    async fn find_latest_paid_invoice(&mut self, organization_id: OrganizationId) -> Result<Option<Invoice>, StoreError>;
    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError>;
    async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError>;
    /// Newest first; `None` lists every organization.
    async fn list_invoices(&mut self, organization_id: Option<OrganizationId>) -> Result<Vec<Invoice>, StoreError>;

    // Sequences
    async fn current_counter(&mut self, scope: &SequenceScope) -> Result<Option<i64>, StoreError>;
    /// Atomically advance the counter row and return the new value. A missing
    /// row is created at `seed + 1`.
    async fn advance_counter(&mut self, scope: &SequenceScope, seed: i64) -> Result<i64, StoreError>;
    async fn identifiers_with_prefix(
        &mut self,
        kind: IdentifierKind,
        prefix: &str,
    ) -> Result<Vec<String>, StoreError>;
    /// Record a minted identifier; `false` if the ledger already holds it.
    async fn record_identifier(
        &mut self,
        kind: IdentifierKind,
        org_code: &str,
        identifier: &str,
    ) -> Result<bool, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Future returned by the body of [`with_transaction`].
pub type TxFuture<'t, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 't>>;

/// Run `work` inside one transaction: commit on `Ok`, roll back on `Err`.
///
/// A panic or cancellation inside `work` drops the transaction, which also
/// discards it.
pub async fn with_transaction<S, T, E, F>(store: &S, work: F) -> Result<T, E>
where
    S: CredentialStore + ?Sized,
    E: From<StoreError>,
    F: for<'t> FnOnce(&'t mut dyn StoreTx) -> TxFuture<'t, T, E>,
{
    let mut tx = store.begin().await?;

    match work(tx.as_mut()).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}
