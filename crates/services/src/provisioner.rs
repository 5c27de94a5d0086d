//! Registration intake and tenant provisioning.
//!
//! Approving a request creates the organization, its school profile (education
//! only) and its first administrator in a single transaction. The generated
//! password is returned exactly once and never stored in clear.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use validator::Validate;

use orgdesk_auth::{Principal, generate_temporary_password, hash_password};
use orgdesk_core::RegistrationId;
use orgdesk_infra::{CredentialStore, with_transaction};
use orgdesk_invoicing::parse_tier;
use orgdesk_tenancy::{
    Organization, RegistrationRequest, RegistrationStatus, SchoolProfile, TransitionPlan,
    UserAccount, normalize_email, normalize_org_code, plan_transition,
};

use crate::error::{ServiceError, ServiceResult};
use crate::inputs::{SubmitRegistrationInput, UpdateStatusInput};
use crate::support::read_only;

/// One-time administrator credentials handed back on approval.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub request: RegistrationRequest,
    /// Present only on the call that provisioned the organization.
    pub credentials: Option<Credentials>,
}

pub struct Provisioner {
    store: Arc<dyn CredentialStore>,
}

impl Provisioner {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), fields(org_code = %input.org_code), err)]
    pub async fn submit_registration(
        &self,
        input: SubmitRegistrationInput,
        now: DateTime<Utc>,
    ) -> ServiceResult<RegistrationRequest> {
        input.validate()?;
        let org_code = normalize_org_code(&input.org_code)
            .map_err(|e| ServiceError::field("org_code", e.to_string()))?;
        let official_email = normalize_email(&input.official_email)
            .map_err(|e| ServiceError::field("official_email", e.to_string()))?;

        let request = RegistrationRequest {
            id: RegistrationId::new(),
            org_name: input.org_name.trim().to_string(),
            org_type: input.org_type,
            org_code,
            contact_person: input.contact_person.trim().to_string(),
            official_email,
            phone: input.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            address: input.address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            industry_type: input.industry_type,
            status: RegistrationStatus::Pending,
            assigned_tier: None,
            reviewed_by_id: None,
            created_at: now,
            updated_at: now,
        };

        let request = with_transaction(self.store.as_ref(), |tx| {
            Box::pin(async move {
                if tx.find_organization_by_code(&request.org_code).await?.is_some() {
                    return Err(ServiceError::DuplicateRegistration(format!(
                        "organization code '{}' is already registered",
                        request.org_code
                    )));
                }
                if tx
                    .find_open_registration(&request.org_code, &request.official_email)
                    .await?
                    .is_some()
                {
                    return Err(ServiceError::DuplicateRegistration(
                        "a pending request already uses this organization code or email".to_string(),
                    ));
                }
                tx.insert_registration(&request).await?;
                Ok(request)
            })
        })
        .await?;

        info!(request_id = %request.id, org_code = %request.org_code, "registration submitted");
        Ok(request)
    }

    /// Move a request to `input.status`; approval provisions the tenant.
    ///
    /// Re-approving an approved request is rejected before any write
    /// transaction is opened.
    #[instrument(skip(self, input, reviewer), fields(target = %input.status, reviewer = %reviewer.user_id), err)]
    pub async fn update_request_status(
        &self,
        id: RegistrationId,
        input: UpdateStatusInput,
        reviewer: &Principal,
        now: DateTime<Utc>,
    ) -> ServiceResult<StatusUpdate> {
        let tier = input
            .assigned_tier
            .as_deref()
            .map(parse_tier)
            .transpose()
            .map_err(|e| ServiceError::field("assigned_tier", e.to_string()))?;
        let target = input.status;
        let reviewer_id = reviewer.user_id;

        let current = self.get_registration(id).await?;
        let plan = plan_transition(current.status, target)?;

        match plan {
            TransitionPlan::StatusOnly => {
                let request = with_transaction::<_, _, ServiceError, _>(self.store.as_ref(), |tx| {
                    Box::pin(async move {
                        let mut request = tx
                            .find_registration(id)
                            .await?
                            .ok_or(ServiceError::NotFound("registration request"))?;
                        plan_transition(request.status, target)?;
                        request.record_review(target, reviewer_id, tier, now);
                        tx.update_registration(&request).await?;
                        Ok(request)
                    })
                })
                .await?;

                info!(request_id = %request.id, status = %request.status, "registration status updated");
                Ok(StatusUpdate {
                    request,
                    credentials: None,
                })
            }
            TransitionPlan::Provision => {
                let password = generate_temporary_password();
                let password_hash = hash_password(&password)?;

                let (request, organization, admin) =
                    with_transaction(self.store.as_ref(), |tx| {
                        Box::pin(async move {
                            let mut request = tx
                                .find_registration(id)
                                .await?
                                .ok_or(ServiceError::NotFound("registration request"))?;
                            if plan_transition(request.status, target)? != TransitionPlan::Provision {
                                return Err(ServiceError::InvalidTransition(format!(
                                    "request {id} can no longer be approved"
                                )));
                            }
                            request.record_review(target, reviewer_id, tier, now);

                            if tx.find_organization_by_code(&request.org_code).await?.is_some() {
                                return Err(ServiceError::DuplicateOrganization(format!(
                                    "organization code '{}' is already in use",
                                    request.org_code
                                )));
                            }
                            let organization = Organization::provisioned(
                                request.org_name.clone(),
                                request.org_code.clone(),
                                request.org_type,
                                request.industry_type,
                                request.effective_tier(),
                                now,
                            );
                            tx.insert_organization(&organization).await?;

                            if let Some(profile) = SchoolProfile::for_organization(&organization, now) {
                                tx.insert_school_profile(&profile).await?;
                            }

                            if tx.find_user_by_email(&request.official_email).await?.is_some() {
                                return Err(ServiceError::DuplicateUser(format!(
                                    "email '{}' is already registered",
                                    request.official_email
                                )));
                            }
                            let admin = UserAccount::new(
                                request.official_email.clone(),
                                password_hash,
                                request.contact_person.clone(),
                                organization.industry_type.administrator_role(),
                                Some(organization.id),
                                now,
                            );
                            tx.insert_user(&admin).await?;

                            tx.update_registration(&request).await?;
                            Ok((request, organization, admin))
                        })
                    })
                    .await?;

                info!(
                    request_id = %request.id,
                    organization_id = %organization.id,
                    org_code = %organization.code,
                    admin_id = %admin.id,
                    admin_role = %admin.role,
                    tier = %organization.subscription_tier,
                    "organization provisioned"
                );

                Ok(StatusUpdate {
                    request,
                    credentials: Some(Credentials {
                        email: admin.email,
                        password,
                    }),
                })
            }
        }
    }

    #[instrument(skip(self), err)]
    pub async fn list_registrations(
        &self,
        status: Option<RegistrationStatus>,
    ) -> ServiceResult<Vec<RegistrationRequest>> {
        read_only(self.store.as_ref(), |tx| {
            Box::pin(async move { Ok(tx.list_registrations(status).await?) })
        })
        .await
    }

    pub async fn get_registration(&self, id: RegistrationId) -> ServiceResult<RegistrationRequest> {
        read_only(self.store.as_ref(), |tx| {
            Box::pin(async move {
                tx.find_registration(id)
                    .await?
                    .ok_or(ServiceError::NotFound("registration request"))
            })
        })
        .await
    }
}
