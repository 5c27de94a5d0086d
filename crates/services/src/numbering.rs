use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use orgdesk_core::OrganizationId;
use orgdesk_infra::{CredentialStore, IdentifierKind, SequenceGenerator, SequenceScope, with_transaction};

use crate::error::{ServiceError, ServiceResult};
use crate::support::retry_on_collision;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedNumber {
    pub kind: IdentifierKind,
    pub identifier: String,
}

/// Mints reference numbers for the caller's organization on behalf of
/// collaborators that own the numbered records (letters, admissions).
pub struct NumberingService {
    store: Arc<dyn CredentialStore>,
    generator: Arc<dyn SequenceGenerator>,
}

impl NumberingService {
    pub fn new(store: Arc<dyn CredentialStore>, generator: Arc<dyn SequenceGenerator>) -> Self {
        Self { store, generator }
    }

    #[instrument(skip(self), err)]
    pub async fn issue(
        &self,
        organization_id: Option<OrganizationId>,
        kind: IdentifierKind,
        now: DateTime<Utc>,
    ) -> ServiceResult<IssuedNumber> {
        let organization_id = organization_id.ok_or_else(|| {
            ServiceError::Forbidden("numbers are issued for an organization only".to_string())
        })?;

        let identifier = retry_on_collision(move || {
            let generator = self.generator.clone();
            with_transaction(self.store.as_ref(), move |tx| {
                Box::pin(async move {
                    let organization = tx
                        .find_organization(organization_id)
                        .await?
                        .ok_or(ServiceError::NotFound("organization"))?;
                    let scope = SequenceScope::new(kind, organization.code, now.year());
                    Ok(generator.next_identifier(tx, &scope).await?)
                })
            })
        })
        .await?;

        info!(%kind, %identifier, "identifier issued");
        Ok(IssuedNumber { kind, identifier })
    }
}
