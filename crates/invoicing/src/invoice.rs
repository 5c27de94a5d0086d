use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orgdesk_core::{DomainError, InvoiceId, OrganizationId};
use orgdesk_tenancy::SubscriptionTier;

use crate::pricing::tier_price;

/// Invoice status lifecycle: `UNPAID → PENDING → PAID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Unpaid,
    /// Payment reported by the tenant, awaiting platform approval.
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "UNPAID",
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPAID" => Ok(InvoiceStatus::Unpaid),
            "PENDING" => Ok(InvoiceStatus::Pending),
            "PAID" => Ok(InvoiceStatus::Paid),
            other => Err(DomainError::validation(format!(
                "unknown invoice status '{other}'"
            ))),
        }
    }
}

/// How the tenant says it paid. Capture happens outside the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    BankTransfer,
    MobileMoney,
    Card,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::MobileMoney => "MOBILE_MONEY",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Cash => "CASH",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
            "MOBILE_MONEY" => Ok(PaymentMethod::MobileMoney),
            "CARD" => Ok(PaymentMethod::Card),
            "CASH" => Ok(PaymentMethod::Cash),
            other => Err(DomainError::validation(format!(
                "unknown payment method '{other}'"
            ))),
        }
    }
}

/// Subscription invoice for one billing period of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    /// `{ORGCODE}/{YEAR}/{NNN}`, globally unique.
    pub invoice_number: String,
    pub organization_id: OrganizationId,
    /// Price in smallest currency unit.
    pub amount: i64,
    pub tier: SubscriptionTier,
    pub status: InvoiceStatus,
    pub payment_method: Option<PaymentMethod>,
    pub transaction_number: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// New UNPAID invoice priced for `tier`.
    pub fn issue(
        invoice_number: String,
        organization_id: OrganizationId,
        tier: SubscriptionTier,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: InvoiceId::new(),
            invoice_number,
            organization_id,
            amount: tier_price(tier),
            tier,
            status: InvoiceStatus::Unpaid,
            payment_method: None,
            transaction_number: None,
            paid_at: None,
            created_at: now,
        }
    }

    /// UNPAID or PENDING. At most one per organization.
    pub fn is_outstanding(&self) -> bool {
        matches!(self.status, InvoiceStatus::Unpaid | InvoiceStatus::Pending)
    }

    /// Record the tenant's payment claim. `tier` re-prices the invoice first.
    pub fn submit_payment(
        &mut self,
        method: PaymentMethod,
        transaction_number: &str,
        tier: Option<SubscriptionTier>,
    ) -> Result<(), DomainError> {
        if self.status != InvoiceStatus::Unpaid {
            return Err(DomainError::invariant(format!(
                "cannot submit payment for {} invoice",
                self.status.as_str()
            )));
        }

        let reference = transaction_number.trim();
        if reference.is_empty() {
            return Err(DomainError::validation("transaction number is required"));
        }

        if let Some(tier) = tier {
            self.reprice(tier);
        }
        self.payment_method = Some(method);
        self.transaction_number = Some(reference.to_string());
        self.status = InvoiceStatus::Pending;
        Ok(())
    }

    /// Platform confirmation of a submitted payment.
    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        match self.status {
            InvoiceStatus::Pending => {
                self.status = InvoiceStatus::Paid;
                self.paid_at = Some(now);
                Ok(())
            }
            InvoiceStatus::Paid => Err(DomainError::conflict("invoice is already paid")),
            InvoiceStatus::Unpaid => Err(DomainError::invariant(
                "cannot approve invoice without a submitted payment",
            )),
        }
    }

    /// Switch the tier of an outstanding invoice.
    pub fn change_tier(&mut self, tier: SubscriptionTier) -> Result<(), DomainError> {
        if !self.is_outstanding() {
            return Err(DomainError::invariant("cannot change tier of a paid invoice"));
        }
        self.reprice(tier);
        Ok(())
    }

    fn reprice(&mut self, tier: SubscriptionTier) {
        self.tier = tier;
        self.amount = tier_price(tier);
    }
}
