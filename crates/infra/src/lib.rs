//! Infrastructure layer: persistence, identifier sequences, configuration.

pub mod config;
pub mod sequence;
pub mod store;

pub use config::{AppConfig, BootstrapAdmin, ConfigError};
pub use sequence::{
    CounterSequenceGenerator, IdentifierKind, SequenceGenerator, SequenceScope,
    next_from_existing, parse_sequence_suffix,
};
pub use store::{
    CredentialStore, InMemoryCredentialStore, PgCredentialStore, StoreCounts, StoreError, StoreTx,
    TxFuture, UniqueConstraint, with_transaction,
};
