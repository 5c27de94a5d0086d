//! In-memory credential store for tests/dev.
//!
//! A transaction holds the store's async mutex for its whole lifetime and
//! works on a private copy of the state; `commit` swaps the copy in. Unique
//! constraints mirror the Postgres schema.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use orgdesk_core::{InvoiceId, OrganizationId, RegistrationId, SchoolProfileId, UserId};
use orgdesk_invoicing::{Invoice, InvoiceStatus};
use orgdesk_tenancy::{
    Organization, RegistrationRequest, RegistrationStatus, SchoolProfile, UserAccount,
};

use super::{CredentialStore, StoreError, StoreTx, UniqueConstraint};
use crate::sequence::{IdentifierKind, SequenceScope};

#[derive(Debug, Default, Clone)]
struct State {
    organizations: HashMap<OrganizationId, Organization>,
    school_profiles: HashMap<SchoolProfileId, SchoolProfile>,
    users: HashMap<UserId, UserAccount>,
    registrations: HashMap<RegistrationId, RegistrationRequest>,
    invoices: HashMap<InvoiceId, Invoice>,
    counters: HashMap<SequenceScope, i64>,
    /// `(kind, identifier) -> org code`
    identifiers: BTreeMap<(IdentifierKind, String), String>,
}

/// Row counts, for asserting what a call did or did not write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub organizations: usize,
    pub school_profiles: usize,
    pub users: usize,
    pub registrations: usize,
    pub invoices: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    state: Arc<Mutex<State>>,
    begun: Arc<AtomicU64>,
    committed: Arc<AtomicU64>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn counts(&self) -> StoreCounts {
        let state = self.state.lock().await;
        StoreCounts {
            organizations: state.organizations.len(),
            school_profiles: state.school_profiles.len(),
            users: state.users.len(),
            registrations: state.registrations.len(),
            invoices: state.invoices.len(),
        }
    }

    /// Number of transactions started so far.
    pub fn transactions_begun(&self) -> u64 {
        self.begun.load(Ordering::SeqCst)
    }

    pub fn transactions_committed(&self) -> u64 {
        self.committed.load(Ordering::SeqCst)
    }

    /// Put identifiers into the ledger without touching counters (imports, tests).
    pub async fn seed_identifiers<I, S>(&self, kind: IdentifierKind, org_code: &str, identifiers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.lock().await;
        for identifier in identifiers {
            state
                .identifiers
                .insert((kind, identifier.into()), org_code.to_string());
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        self.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryTx {
            guard,
            working,
            committed: self.committed.clone(),
        }))
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<State>,
    working: State,
    committed: Arc<AtomicU64>,
}

fn sorted_by<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn find_organization(&mut self, id: OrganizationId) -> Result<Option<Organization>, StoreError> {
        Ok(self.working.organizations.get(&id).cloned())
    }

    async fn find_organization_by_code(&mut self, code: &str) -> Result<Option<Organization>, StoreError> {
        Ok(self
            .working
            .organizations
            .values()
            .find(|o| o.code == code)
            .cloned())
    }

    async fn insert_organization(&mut self, org: &Organization) -> Result<(), StoreError> {
        if self.working.organizations.values().any(|o| o.code == org.code) {
            return Err(StoreError::UniqueViolation(UniqueConstraint::OrganizationCode));
        }
        self.working.organizations.insert(org.id, org.clone());
        Ok(())
    }

    async fn update_organization(&mut self, org: &Organization) -> Result<(), StoreError> {
        let slot = self
            .working
            .organizations
            .get_mut(&org.id)
            .ok_or(StoreError::NotFound)?;
        *slot = org.clone();
        Ok(())
    }

    async fn insert_school_profile(&mut self, profile: &SchoolProfile) -> Result<(), StoreError> {
        if self
            .working
            .school_profiles
            .values()
            .any(|p| p.organization_id == profile.organization_id)
        {
            return Err(StoreError::UniqueViolation(UniqueConstraint::SchoolProfile));
        }
        self.working.school_profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn find_user(&mut self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(self
            .working
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&mut self, user: &UserAccount) -> Result<(), StoreError> {
        if self.working.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation(UniqueConstraint::UserEmail));
        }
        self.working.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&mut self, user: &UserAccount) -> Result<(), StoreError> {
        let slot = self.working.users.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        *slot = user.clone();
        Ok(())
    }

    async fn list_users(&mut self, organization_id: OrganizationId) -> Result<Vec<UserAccount>, StoreError> {
        let users = self
            .working
            .users
            .values()
            .filter(|u| u.organization_id == Some(organization_id))
            .cloned()
            .collect();
        Ok(sorted_by(users, |u| u.created_at))
    }

    async fn find_registration(&mut self, id: RegistrationId) -> Result<Option<RegistrationRequest>, StoreError> {
        Ok(self.working.registrations.get(&id).cloned())
    }

    async fn find_open_registration(
        &mut self,
        code: &str,
        email: &str,
    ) -> Result<Option<RegistrationRequest>, StoreError> {
        Ok(self
            .working
            .registrations
            .values()
            .find(|r| r.status.is_open() && (r.org_code == code || r.official_email == email))
            .cloned())
    }

    async fn insert_registration(&mut self, request: &RegistrationRequest) -> Result<(), StoreError> {
        self.working.registrations.insert(request.id, request.clone());
        Ok(())
    }

    async fn update_registration(&mut self, request: &RegistrationRequest) -> Result<(), StoreError> {
        let slot = self
            .working
            .registrations
            .get_mut(&request.id)
            .ok_or(StoreError::NotFound)?;
        *slot = request.clone();
        Ok(())
    }

    async fn list_registrations(
        &mut self,
        status: Option<RegistrationStatus>,
    ) -> Result<Vec<RegistrationRequest>, StoreError> {
        let requests = self
            .working
            .registrations
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        Ok(sorted_by(requests, |r| r.created_at))
    }

    async fn find_invoice(&mut self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        Ok(self.working.invoices.get(&id).cloned())
    }

    async fn find_outstanding_invoice(&mut self, organization_id: OrganizationId) -> Result<Option<Invoice>, StoreError> {
        Ok(self
            .working
            .invoices
            .values()
            .find(|i| i.organization_id == organization_id && i.is_outstanding())
            .cloned())
    }

    async fn find_latest_paid_invoice(&mut self, organization_id: OrganizationId) -> Result<Option<Invoice>, StoreError> {
        Ok(self
            .working
            .invoices
            .values()
            .filter(|i| i.organization_id == organization_id && i.status == InvoiceStatus::Paid)
            .max_by_key(|i| (i.paid_at, i.created_at))
            .cloned())
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError> {
        let invoices = &self.working.invoices;
        if invoices.values().any(|i| i.invoice_number == invoice.invoice_number) {
            return Err(StoreError::UniqueViolation(UniqueConstraint::InvoiceNumber));
        }
        if invoice.is_outstanding()
            && invoices
                .values()
                .any(|i| i.organization_id == invoice.organization_id && i.is_outstanding())
        {
            return Err(StoreError::UniqueViolation(UniqueConstraint::OutstandingInvoice));
        }
        self.working.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError> {
        let slot = self
            .working
            .invoices
            .get_mut(&invoice.id)
            .ok_or(StoreError::NotFound)?;
        *slot = invoice.clone();
        Ok(())
    }

    async fn list_invoices(&mut self, organization_id: Option<OrganizationId>) -> Result<Vec<Invoice>, StoreError> {
        let mut invoices: Vec<Invoice> = self
            .working
            .invoices
            .values()
            .filter(|i| organization_id.is_none_or(|org| i.organization_id == org))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invoices)
    }

    async fn current_counter(&mut self, scope: &SequenceScope) -> Result<Option<i64>, StoreError> {
        Ok(self.working.counters.get(scope).copied())
    }

    async fn advance_counter(&mut self, scope: &SequenceScope, seed: i64) -> Result<i64, StoreError> {
        let value = self
            .working
            .counters
            .entry(scope.clone())
            .and_modify(|v| *v += 1)
            .or_insert(seed + 1);
        Ok(*value)
    }

    async fn identifiers_with_prefix(
        &mut self,
        kind: IdentifierKind,
        prefix: &str,
    ) -> Result<Vec<String>, StoreError> {
        Ok(self
            .working
            .identifiers
            .keys()
            .filter(|(k, id)| *k == kind && id.starts_with(prefix))
            .map(|(_, id)| id.clone())
            .collect())
    }

    async fn record_identifier(
        &mut self,
        kind: IdentifierKind,
        org_code: &str,
        identifier: &str,
    ) -> Result<bool, StoreError> {
        let key = (kind, identifier.to_string());
        if self.working.identifiers.contains_key(&key) {
            return Ok(false);
        }
        self.working.identifiers.insert(key, org_code.to_string());
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTx {
            mut guard,
            working,
            committed,
        } = *self;
        *guard = working;
        committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::with_transaction;
    use chrono::Utc;
    use orgdesk_auth::Role;
    use orgdesk_tenancy::{IndustryType, OrganizationType, SubscriptionTier};

    fn org(code: &str) -> Organization {
        Organization::provisioned(
            format!("{code} org"),
            code.to_string(),
            OrganizationType::Private,
            IndustryType::Business,
            SubscriptionTier::Basic,
            Utc::now(),
        )
    }

    fn user(email: &str) -> UserAccount {
        UserAccount::new(email.into(), "hash".into(), "Name".into(), Role::User, None, Utc::now())
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = InMemoryCredentialStore::new();
        let o = org("ACME");
        let mut tx = store.begin().await.unwrap();
        tx.insert_organization(&o).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.find_organization_by_code("ACME").await.unwrap(), Some(o));
        assert_eq!(store.transactions_committed(), 1);
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = InMemoryCredentialStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_user(&user("a@b.co")).await.unwrap();
        }
        assert_eq!(store.counts().await.users, 0);
    }

    #[tokio::test]
    async fn unique_constraints_are_enforced() {
        let store = InMemoryCredentialStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_organization(&org("ACME")).await.unwrap();
        assert_eq!(
            tx.insert_organization(&org("ACME")).await,
            Err(StoreError::UniqueViolation(UniqueConstraint::OrganizationCode))
        );

        tx.insert_user(&user("a@b.co")).await.unwrap();
        assert_eq!(
            tx.insert_user(&user("a@b.co")).await,
            Err(StoreError::UniqueViolation(UniqueConstraint::UserEmail))
        );
    }

    #[tokio::test]
    async fn one_outstanding_invoice_per_org() {
        let store = InMemoryCredentialStore::new();
        let o = org("ACME");
        let mut tx = store.begin().await.unwrap();
        tx.insert_invoice(&Invoice::issue("ACME/2026/001".into(), o.id, SubscriptionTier::Basic, Utc::now()))
            .await
            .unwrap();
        assert_eq!(
            tx.insert_invoice(&Invoice::issue("ACME/2026/002".into(), o.id, SubscriptionTier::Basic, Utc::now()))
                .await,
            Err(StoreError::UniqueViolation(UniqueConstraint::OutstandingInvoice))
        );
    }

    #[tokio::test]
    async fn with_transaction_rolls_back_on_error() {
        let store = InMemoryCredentialStore::new();
        let result: Result<(), StoreError> = with_transaction(&store, |tx| {
            Box::pin(async move {
                tx.insert_user(&user("a@b.co")).await?;
                Err(StoreError::backend("boom"))
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(store.counts().await.users, 0);
        assert_eq!(store.transactions_committed(), 0);
    }

    #[tokio::test]
    async fn with_transaction_commits_on_success() {
        let store = InMemoryCredentialStore::new();
        let id = with_transaction(&store, |tx| {
            Box::pin(async move {
                let u = user("a@b.co");
                tx.insert_user(&u).await?;
                Ok::<_, StoreError>(u.id)
            })
        })
        .await
        .unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_user(id).await.unwrap().is_some());
    }
}
