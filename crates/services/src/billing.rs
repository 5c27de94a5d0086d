//! Subscription invoices: issue on lapse, tenant payment claim, platform
//! approval with organization reactivation.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use validator::Validate;

use orgdesk_core::{InvoiceId, OrganizationId};
use orgdesk_infra::{
    CredentialStore, IdentifierKind, SequenceGenerator, SequenceScope, StoreTx, with_transaction,
};
use orgdesk_invoicing::{BillingDecision, Invoice, decide_billing, parse_tier};
use orgdesk_tenancy::Organization;

use crate::error::{ServiceError, ServiceResult};
use crate::inputs::{SubmitPaymentInput, UpdateTierInput};
use crate::support::{read_only, retry_on_collision};

/// Result of a payment approval: the paid invoice and the renewed tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovedPayment {
    pub invoice: Invoice,
    pub organization: Organization,
}

pub struct BillingService {
    store: Arc<dyn CredentialStore>,
    generator: Arc<dyn SequenceGenerator>,
}

/// Load an invoice the caller may see. `scope == None` is the platform view.
async fn scoped_invoice(
    tx: &mut dyn StoreTx,
    scope: Option<OrganizationId>,
    invoice_id: InvoiceId,
) -> ServiceResult<Invoice> {
    match tx.find_invoice(invoice_id).await? {
        Some(invoice) if scope.is_none_or(|org| org == invoice.organization_id) => Ok(invoice),
        _ => Err(ServiceError::NotFound("invoice")),
    }
}

impl BillingService {
    pub fn new(store: Arc<dyn CredentialStore>, generator: Arc<dyn SequenceGenerator>) -> Self {
        Self { store, generator }
    }

    /// The invoice the organization should act on now, issuing one when the
    /// subscription has lapsed. Repeated calls return the same invoice.
    #[instrument(skip(self), err)]
    pub async fn get_or_create_invoice(
        &self,
        organization_id: OrganizationId,
        now: DateTime<Utc>,
    ) -> ServiceResult<Option<Invoice>> {
        retry_on_collision(move || {
            let generator = self.generator.clone();
            with_transaction(self.store.as_ref(), move |tx| {
                Box::pin(async move {
                    let organization = tx
                        .find_organization(organization_id)
                        .await?
                        .ok_or(ServiceError::NotFound("organization"))?;
                    let outstanding = tx.find_outstanding_invoice(organization_id).await?;
                    let latest_paid = match outstanding {
                        Some(_) => None,
                        None => tx.find_latest_paid_invoice(organization_id).await?,
                    };

                    match decide_billing(&organization, outstanding, latest_paid, now) {
                        BillingDecision::Outstanding(invoice) => Ok(Some(invoice)),
                        BillingDecision::Current(latest) => Ok(latest),
                        BillingDecision::IssueNew => {
                            let scope = SequenceScope::new(
                                IdentifierKind::Invoice,
                                organization.code.clone(),
                                now.year(),
                            );
                            let number = generator.next_identifier(&mut *tx, &scope).await?;
                            let invoice = Invoice::issue(
                                number,
                                organization.id,
                                organization.subscription_tier,
                                now,
                            );
                            tx.insert_invoice(&invoice).await?;
                            info!(
                                invoice_id = %invoice.id,
                                invoice_number = %invoice.invoice_number,
                                amount = invoice.amount,
                                "renewal invoice issued"
                            );
                            Ok(Some(invoice))
                        }
                    }
                })
            })
        })
        .await
    }

    /// Tenant claims to have paid. The organization stays as it is until a
    /// platform admin approves the payment.
    #[instrument(skip(self, input), err)]
    pub async fn submit_payment(
        &self,
        scope: Option<OrganizationId>,
        invoice_id: InvoiceId,
        input: SubmitPaymentInput,
    ) -> ServiceResult<Invoice> {
        input.validate()?;
        let tier = input
            .tier
            .as_deref()
            .map(parse_tier)
            .transpose()
            .map_err(|e| ServiceError::field("tier", e.to_string()))?;

        let invoice = with_transaction::<_, _, ServiceError, _>(self.store.as_ref(), |tx| {
            Box::pin(async move {
                let mut invoice = scoped_invoice(tx, scope, invoice_id).await?;
                invoice.submit_payment(input.payment_method, &input.transaction_number, tier)?;
                tx.update_invoice(&invoice).await?;
                Ok(invoice)
            })
        })
        .await?;

        info!(invoice_id = %invoice.id, method = invoice.payment_method.map(|m| m.as_str()), "payment submitted");
        Ok(invoice)
    }

    #[instrument(skip(self, input), err)]
    pub async fn update_invoice_tier(
        &self,
        scope: Option<OrganizationId>,
        invoice_id: InvoiceId,
        input: UpdateTierInput,
    ) -> ServiceResult<Invoice> {
        let tier = parse_tier(&input.tier).map_err(|e| ServiceError::field("tier", e.to_string()))?;

        with_transaction(self.store.as_ref(), |tx| {
            Box::pin(async move {
                let mut invoice = scoped_invoice(tx, scope, invoice_id).await?;
                invoice.change_tier(tier)?;
                tx.update_invoice(&invoice).await?;
                Ok(invoice)
            })
        })
        .await
    }

    /// Confirm a submitted payment and renew the organization, atomically.
    #[instrument(skip(self), err)]
    pub async fn approve_invoice(
        &self,
        invoice_id: InvoiceId,
        now: DateTime<Utc>,
    ) -> ServiceResult<ApprovedPayment> {
        let approved = with_transaction::<_, _, ServiceError, _>(self.store.as_ref(), |tx| {
            Box::pin(async move {
                let mut invoice = scoped_invoice(tx, None, invoice_id).await?;
                invoice.approve(now)?;
                let mut organization = tx
                    .find_organization(invoice.organization_id)
                    .await?
                    .ok_or(ServiceError::NotFound("organization"))?;
                organization.reactivate(invoice.tier, now);

                tx.update_invoice(&invoice).await?;
                tx.update_organization(&organization).await?;
                Ok(ApprovedPayment {
                    invoice,
                    organization,
                })
            })
        })
        .await?;

        info!(
            invoice_id = %approved.invoice.id,
            organization_id = %approved.organization.id,
            tier = %approved.organization.subscription_tier,
            "payment approved, organization reactivated"
        );
        Ok(approved)
    }

    pub async fn list_invoices(&self, scope: Option<OrganizationId>) -> ServiceResult<Vec<Invoice>> {
        read_only(self.store.as_ref(), |tx| {
            Box::pin(async move { Ok(tx.list_invoices(scope).await?) })
        })
        .await
    }
}
