//! Subscription invoicing domain module.
//!
//! Business rules for the per-period subscription invoice of an organization,
//! implemented as deterministic domain logic (no IO, no HTTP, no storage).

pub mod billing;
pub mod invoice;
pub mod pricing;

pub use billing::{BillingDecision, decide_billing};
pub use invoice::{Invoice, InvoiceStatus, PaymentMethod};
pub use pricing::{parse_tier, tier_price};
