use chrono::{DateTime, Utc};

use orgdesk_tenancy::Organization;

use crate::invoice::Invoice;

/// Outcome of the "current invoice" lookup for an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingDecision {
    /// An UNPAID/PENDING invoice exists; return it unchanged.
    Outstanding(Invoice),
    /// The subscription lapsed and nothing is outstanding; issue a new invoice.
    IssueNew,
    /// Subscription is current; show the latest paid invoice, if any.
    Current(Option<Invoice>),
}

/// Decide what `get_or_create` should return.
///
/// Repeated calls with the same stored state yield the same decision, and once
/// an invoice is issued it is returned as `Outstanding`, so the operation is
/// idempotent.
pub fn decide_billing(
    organization: &Organization,
    outstanding: Option<Invoice>,
    latest_paid: Option<Invoice>,
    now: DateTime<Utc>,
) -> BillingDecision {
    if let Some(invoice) = outstanding {
        return BillingDecision::Outstanding(invoice);
    }
    if organization.requires_renewal(now) {
        return BillingDecision::IssueNew;
    }
    BillingDecision::Current(latest_paid)
}
