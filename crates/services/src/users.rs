//! Organization member administration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use validator::Validate;

use orgdesk_auth::{Principal, generate_temporary_password, hash_password};
use orgdesk_core::{OrganizationId, UserId};
use orgdesk_infra::{CredentialStore, with_transaction};
use orgdesk_tenancy::{UserAccount, UserProfile, can_grant_role, normalize_email};

use crate::error::{ServiceError, ServiceResult};
use crate::inputs::CreateMemberInput;
use crate::provisioner::Credentials;
use crate::support::read_only;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedMember {
    pub member: UserProfile,
    pub credentials: Credentials,
}

pub struct MemberService {
    store: Arc<dyn CredentialStore>,
}

fn organization_of(actor: &Principal) -> ServiceResult<OrganizationId> {
    actor
        .organization_id
        .ok_or_else(|| ServiceError::Forbidden("caller does not belong to an organization".to_string()))
}

impl MemberService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Add a member to the actor's organization with a one-time password.
    ///
    /// The role must be assignable in the organization's industry and must
    /// not grant anything the actor's own role lacks.
    #[instrument(skip(self, actor, input), fields(actor = %actor.user_id, role = %input.role), err)]
    pub async fn create_member(
        &self,
        actor: &Principal,
        input: CreateMemberInput,
        now: DateTime<Utc>,
    ) -> ServiceResult<CreatedMember> {
        let organization_id = organization_of(actor)?;
        input.validate()?;
        let email = normalize_email(&input.email).map_err(|e| ServiceError::field("email", e.to_string()))?;
        let actor_role = actor.role;

        let password = generate_temporary_password();
        let password_hash = hash_password(&password)?;

        let member = with_transaction(self.store.as_ref(), |tx| {
            Box::pin(async move {
                let organization = tx
                    .find_organization(organization_id)
                    .await?
                    .ok_or(ServiceError::NotFound("organization"))?;
                if !can_grant_role(actor_role, input.role, &organization) {
                    return Err(ServiceError::Forbidden(format!(
                        "role {} cannot be granted here by {}",
                        input.role, actor_role
                    )));
                }
                if tx.find_user_by_email(&email).await?.is_some() {
                    return Err(ServiceError::DuplicateUser(format!("email '{email}' is already registered")));
                }

                let account = UserAccount::new(
                    email,
                    password_hash,
                    input.full_name.trim().to_string(),
                    input.role,
                    Some(organization.id),
                    now,
                );
                tx.insert_user(&account).await?;
                Ok(account.profile(Some(&organization)))
            })
        })
        .await?;

        info!(member_id = %member.id, role = %member.role, "member created");
        Ok(CreatedMember {
            credentials: Credentials {
                email: member.email.clone(),
                password,
            },
            member,
        })
    }

    pub async fn list_members(&self, actor: &Principal) -> ServiceResult<Vec<UserProfile>> {
        let organization_id = organization_of(actor)?;
        read_only(self.store.as_ref(), |tx| {
            Box::pin(async move {
                let organization = tx.find_organization(organization_id).await?;
                let members = tx.list_users(organization_id).await?;
                Ok(members
                    .iter()
                    .map(|m| m.profile(organization.as_ref()))
                    .collect())
            })
        })
        .await
    }

    /// Soft-disable or re-enable a member of the actor's organization.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id), err)]
    pub async fn set_active(
        &self,
        actor: &Principal,
        member_id: UserId,
        active: bool,
    ) -> ServiceResult<UserProfile> {
        let organization_id = organization_of(actor)?;
        if member_id == actor.user_id && !active {
            return Err(ServiceError::Conflict("cannot deactivate your own account".to_string()));
        }
        let actor_role = actor.role;

        with_transaction(self.store.as_ref(), |tx| {
            Box::pin(async move {
                let mut member = match tx.find_user(member_id).await? {
                    Some(user) if user.organization_id == Some(organization_id) => user,
                    _ => return Err(ServiceError::NotFound("user")),
                };
                let organization = tx
                    .find_organization(organization_id)
                    .await?
                    .ok_or(ServiceError::NotFound("organization"))?;
                if !can_grant_role(actor_role, member.role, &organization) {
                    return Err(ServiceError::Forbidden(format!(
                        "{} cannot change the status of a {} account",
                        actor_role, member.role
                    )));
                }

                if member.is_active != active {
                    member.is_active = active;
                    tx.update_user(&member).await?;
                    info!(member_id = %member.id, active, "member status changed");
                }
                Ok(member.profile(Some(&organization)))
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgdesk_auth::{Role, verify_password};
    use orgdesk_infra::{InMemoryCredentialStore, StoreTx};
    use orgdesk_tenancy::{IndustryType, Organization, OrganizationType, SubscriptionTier};

    struct Fixture {
        service: MemberService,
        store: InMemoryCredentialStore,
        admin: Principal,
        org: Organization,
    }

    async fn fixture(industry: IndustryType) -> Fixture {
        let store = InMemoryCredentialStore::new();
        let org = Organization::provisioned(
            "Org".into(),
            "ORG".into(),
            OrganizationType::Private,
            industry,
            SubscriptionTier::Basic,
            Utc::now(),
        );
        let admin = UserAccount::new(
            "admin@org.io".into(),
            hash_password("irrelevant").unwrap(),
            "Admin".into(),
            industry.administrator_role(),
            Some(org.id),
            Utc::now(),
        );
        let mut tx = store.begin().await.unwrap();
        tx.insert_organization(&org).await.unwrap();
        tx.insert_user(&admin).await.unwrap();
        tx.commit().await.unwrap();

        Fixture {
            service: MemberService::new(Arc::new(store.clone())),
            store,
            admin: Principal::new(admin.id, admin.role, Some(org.id)),
            org,
        }
    }

    fn member(email: &str, role: Role) -> CreateMemberInput {
        CreateMemberInput {
            full_name: "Member".into(),
            email: email.into(),
            role,
        }
    }

    #[tokio::test]
    async fn admin_creates_member_with_working_password() {
        let f = fixture(IndustryType::Education).await;
        let created = f
            .service
            .create_member(&f.admin, member("Teacher@Org.io", Role::Teacher), Utc::now())
            .await
            .unwrap();

        assert_eq!(created.member.email, "teacher@org.io");
        assert_eq!(created.member.organization_id, Some(f.org.id));
        assert_eq!(created.credentials.password.len(), 12);

        let mut tx = f.store.begin().await.unwrap();
        let stored = tx.find_user_by_email("teacher@org.io").await.unwrap().unwrap();
        tx.rollback().await.unwrap();
        assert!(verify_password(&created.credentials.password, &stored.password_hash).unwrap());

        assert_eq!(f.service.list_members(&f.admin).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn platform_and_foreign_industry_roles_are_refused() {
        let f = fixture(IndustryType::Education).await;
        for role in [Role::SuperAdmin, Role::Doctor] {
            let err = f
                .service
                .create_member(&f.admin, member("x@org.io", role), Utc::now())
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Forbidden(_)), "{role}");
        }
        assert_eq!(f.store.counts().await.users, 1);
    }

    #[tokio::test]
    async fn members_cannot_grant_more_than_they_hold() {
        let f = fixture(IndustryType::Education).await;
        let teacher = f
            .service
            .create_member(&f.admin, member("teacher@org.io", Role::Teacher), Utc::now())
            .await
            .unwrap()
            .member;
        let as_teacher = Principal::new(teacher.id, Role::Teacher, Some(f.org.id));

        let err = f
            .service
            .create_member(&as_teacher, member("boss@org.io", Role::SchoolAdmin), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let f = fixture(IndustryType::Business).await;
        let err = f
            .service
            .create_member(&f.admin, member("ADMIN@org.io", Role::Hr), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateUser(_)));
    }

    #[tokio::test]
    async fn deactivation_and_reactivation() {
        let f = fixture(IndustryType::Business).await;
        let officer = f
            .service
            .create_member(&f.admin, member("officer@org.io", Role::Officer), Utc::now())
            .await
            .unwrap()
            .member;

        let disabled = f.service.set_active(&f.admin, officer.id, false).await.unwrap();
        assert!(!disabled.is_active);
        let enabled = f.service.set_active(&f.admin, officer.id, true).await.unwrap();
        assert!(enabled.is_active);

        assert!(matches!(
            f.service.set_active(&f.admin, f.admin.user_id, false).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn members_of_other_organizations_are_invisible() {
        let f = fixture(IndustryType::Business).await;
        let outsider = Principal::new(UserId::new(), Role::OrgAdmin, Some(OrganizationId::new()));
        assert_eq!(
            f.service.set_active(&outsider, f.admin.user_id, false).await,
            Err(ServiceError::NotFound("user"))
        );

        let applicant = Principal::new(UserId::new(), Role::Applicant, None);
        assert!(matches!(
            f.service.list_members(&applicant).await,
            Err(ServiceError::Forbidden(_))
        ));
    }
}
