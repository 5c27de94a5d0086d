//! Per-organization, per-year human-readable reference numbers.
//!
//! Identifiers look like `{ORGCODE}/{YEAR}/{SEQ}` with a zero-padded sequence
//! whose width depends on the kind. Each scope `(kind, org code, year)` owns
//! one counter row; advancing it is a single atomic statement inside the
//! caller's transaction, and every minted identifier is recorded in a ledger
//! with a unique constraint.

use core::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use orgdesk_core::DomainError;

use crate::store::{StoreError, StoreTx, UniqueConstraint};

/// Ledger collisions tolerated before giving up on a scope.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentifierKind {
    Letter,
    Invoice,
    Admission,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Letter => "LETTER",
            IdentifierKind::Invoice => "INVOICE",
            IdentifierKind::Admission => "ADMISSION",
        }
    }

    /// Zero-padded digits of the trailing segment.
    pub fn width(&self) -> usize {
        match self {
            IdentifierKind::Letter | IdentifierKind::Invoice => 3,
            IdentifierKind::Admission => 4,
        }
    }
}

impl core::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierKind {
    type Err = DomainError;

    /// Case-insensitive, so URL path segments like `letter` parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LETTER" => Ok(IdentifierKind::Letter),
            "INVOICE" => Ok(IdentifierKind::Invoice),
            "ADMISSION" => Ok(IdentifierKind::Admission),
            _ => Err(DomainError::validation(format!("unknown identifier kind '{s}'"))),
        }
    }
}

/// The namespace a counter lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceScope {
    pub kind: IdentifierKind,
    pub org_code: String,
    pub year: i32,
}

impl SequenceScope {
    pub fn new(kind: IdentifierKind, org_code: impl Into<String>, year: i32) -> Self {
        Self {
            kind,
            org_code: org_code.into(),
            year,
        }
    }

    /// `{ORGCODE}/{YEAR}/`
    pub fn prefix(&self) -> String {
        format!("{}/{}/", self.org_code, self.year)
    }

    pub fn format(&self, value: i64) -> String {
        format!("{}{:0width$}", self.prefix(), value, width = self.kind.width())
    }
}

/// Numeric trailing segment of `identifier` when it belongs to `prefix`.
pub fn parse_sequence_suffix(identifier: &str, prefix: &str) -> Option<i64> {
    let suffix = identifier.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// `max(existing suffix) + 1`, or `1` for an empty scope. Gaps are not reused.
pub fn next_from_existing<'a, I>(existing: I, prefix: &str) -> i64
where
    I: IntoIterator<Item = &'a str>,
{
    highest_suffix(existing, prefix) + 1
}

fn highest_suffix<'a, I>(existing: I, prefix: &str) -> i64
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|id| parse_sequence_suffix(id, prefix))
        .max()
        .unwrap_or(0)
}

/// Mints identifiers inside a caller-owned transaction.
#[async_trait]
pub trait SequenceGenerator: Send + Sync {
    async fn next_identifier(
        &self,
        tx: &mut dyn StoreTx,
        scope: &SequenceScope,
    ) -> Result<String, StoreError>;
}

/// Counter-row generator with ledger uniqueness and bounded retry.
#[derive(Debug, Clone)]
pub struct CounterSequenceGenerator {
    max_attempts: u32,
}

impl CounterSequenceGenerator {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for CounterSequenceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

#[async_trait]
impl SequenceGenerator for CounterSequenceGenerator {
    #[instrument(
        skip(self, tx),
        fields(kind = %scope.kind, org_code = %scope.org_code, year = scope.year),
        err
    )]
    async fn next_identifier(
        &self,
        tx: &mut dyn StoreTx,
        scope: &SequenceScope,
    ) -> Result<String, StoreError> {
        // Only consulted when the counter row does not exist yet.
        let seed = match tx.current_counter(scope).await? {
            Some(_) => 0,
            None => {
                let existing = tx.identifiers_with_prefix(scope.kind, &scope.prefix()).await?;
                let seed = highest_suffix(existing.iter().map(String::as_str), &scope.prefix());
                debug!(seed, existing = existing.len(), "seeding sequence counter");
                seed
            }
        };

        for attempt in 1..=self.max_attempts {
            let value = tx.advance_counter(scope, seed).await?;
            let identifier = scope.format(value);
            if tx
                .record_identifier(scope.kind, &scope.org_code, &identifier)
                .await?
            {
                return Ok(identifier);
            }
            warn!(%identifier, attempt, "identifier already issued, advancing");
        }

        Err(StoreError::UniqueViolation(UniqueConstraint::Identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CredentialStore, InMemoryCredentialStore};

    fn scope(kind: IdentifierKind) -> SequenceScope {
        SequenceScope::new(kind, "GFA", 2026)
    }

    #[test]
    fn formats_are_zero_padded_per_kind() {
        assert_eq!(scope(IdentifierKind::Letter).format(7), "GFA/2026/007");
        assert_eq!(scope(IdentifierKind::Invoice).format(12), "GFA/2026/012");
        assert_eq!(scope(IdentifierKind::Admission).format(3), "GFA/2026/0003");
        assert_eq!(scope(IdentifierKind::Letter).format(1234), "GFA/2026/1234");
    }

    #[test]
    fn suffix_parsing_ignores_foreign_and_malformed_ids() {
        let prefix = "GFA/2026/";
        assert_eq!(parse_sequence_suffix("GFA/2026/0042", prefix), Some(42));
        assert_eq!(parse_sequence_suffix("GFA/2025/0042", prefix), None);
        assert_eq!(parse_sequence_suffix("GFA/2026/", prefix), None);
        assert_eq!(parse_sequence_suffix("GFA/2026/12a", prefix), None);
        assert_eq!(parse_sequence_suffix("GFA/2026/-1", prefix), None);
    }

    #[test]
    fn next_is_max_plus_one_and_tolerates_gaps() {
        let prefix = "GFA/2026/";
        assert_eq!(next_from_existing(["GFA/2026/0001", "GFA/2026/0003"], prefix), 4);
        assert_eq!(next_from_existing(Vec::<&str>::new(), prefix), 1);
        assert_eq!(next_from_existing(["OTHER/2026/0099"], prefix), 1);
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("admission".parse::<IdentifierKind>().unwrap(), IdentifierKind::Admission);
        assert!("memo".parse::<IdentifierKind>().is_err());
    }

    async fn mint(store: &InMemoryCredentialStore, scope: &SequenceScope) -> String {
        let generator = CounterSequenceGenerator::default();
        let mut tx = store.begin().await.unwrap();
        let id = generator.next_identifier(tx.as_mut(), scope).await.unwrap();
        tx.commit().await.unwrap();
        id
    }

    #[tokio::test]
    async fn first_identifier_in_empty_scope_is_one() {
        let store = InMemoryCredentialStore::new();
        assert_eq!(mint(&store, &scope(IdentifierKind::Letter)).await, "GFA/2026/001");
        assert_eq!(mint(&store, &scope(IdentifierKind::Letter)).await, "GFA/2026/002");
    }

    #[tokio::test]
    async fn counter_seeds_from_existing_identifiers() {
        let store = InMemoryCredentialStore::new();
        let scope = scope(IdentifierKind::Admission);
        store
            .seed_identifiers(scope.kind, "GFA", ["GFA/2026/0001", "GFA/2026/0003"])
            .await;

        assert_eq!(mint(&store, &scope).await, "GFA/2026/0004");
    }

    #[tokio::test]
    async fn ledger_collisions_are_skipped() {
        let store = InMemoryCredentialStore::new();
        let scope = scope(IdentifierKind::Letter);
        assert_eq!(mint(&store, &scope).await, "GFA/2026/001");
        // Issued outside the counter, e.g. by an import.
        store
            .seed_identifiers(scope.kind, "GFA", ["GFA/2026/002", "GFA/2026/003"])
            .await;

        assert_eq!(mint(&store, &scope).await, "GFA/2026/004");
    }

    #[tokio::test]
    async fn exhausted_attempts_report_unique_violation() {
        let store = InMemoryCredentialStore::new();
        let scope = scope(IdentifierKind::Letter);
        assert_eq!(mint(&store, &scope).await, "GFA/2026/001");
        store
            .seed_identifiers(scope.kind, "GFA", ["GFA/2026/002", "GFA/2026/003"])
            .await;

        let generator = CounterSequenceGenerator::new(2);
        let mut tx = store.begin().await.unwrap();
        let err = generator.next_identifier(tx.as_mut(), &scope).await.unwrap_err();
        assert_eq!(err, StoreError::UniqueViolation(UniqueConstraint::Identifier));
    }

    #[tokio::test]
    async fn scopes_are_independent() {
        let store = InMemoryCredentialStore::new();
        assert_eq!(mint(&store, &scope(IdentifierKind::Letter)).await, "GFA/2026/001");
        assert_eq!(mint(&store, &scope(IdentifierKind::Invoice)).await, "GFA/2026/001");
        assert_eq!(
            mint(&store, &SequenceScope::new(IdentifierKind::Letter, "GFA", 2027)).await,
            "GFA/2027/001"
        );
        assert_eq!(
            mint(&store, &SequenceScope::new(IdentifierKind::Letter, "KHS", 2026)).await,
            "KHS/2026/001"
        );
    }

    #[tokio::test]
    async fn uncommitted_identifiers_are_discarded() {
        let store = InMemoryCredentialStore::new();
        let scope = scope(IdentifierKind::Letter);
        {
            let generator = CounterSequenceGenerator::default();
            let mut tx = store.begin().await.unwrap();
            generator.next_identifier(tx.as_mut(), &scope).await.unwrap();
            tx.rollback().await.unwrap();
        }
        assert_eq!(mint(&store, &scope).await, "GFA/2026/001");
    }
}
