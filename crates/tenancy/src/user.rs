use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orgdesk_auth::{Role, role_permissions};
use orgdesk_core::{DomainError, OrganizationId, UserId};

use crate::organization::Organization;

/// Canonical form of an account email (trimmed, lower-cased).
pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(DomainError::validation("invalid email address")),
    }
}

/// Stored account record. Never serialized to clients: see [`UserProfile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    /// Globally unique, lower-case.
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(
        email: String,
        password_hash: String,
        full_name: String,
        role: Role,
        organization_id: Option<OrganizationId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            email,
            password_hash,
            full_name,
            role,
            organization_id,
            is_active: true,
            created_at: now,
        }
    }

    /// Client-facing view without credentials.
    pub fn profile(&self, organization: Option<&Organization>) -> UserProfile {
        UserProfile {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            role: self.role,
            organization_id: self.organization_id,
            is_active: self.is_active,
            organization: organization.map(OrganizationSummary::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    pub id: OrganizationId,
    pub name: String,
    pub code: String,
    pub is_active: bool,
    pub expiration_date: Option<DateTime<Utc>>,
}

impl From<&Organization> for OrganizationSummary {
    fn from(org: &Organization) -> Self {
        Self {
            id: org.id,
            name: org.name.clone(),
            code: org.code.clone(),
            is_active: org.is_active,
            expiration_date: org.expiration_date,
        }
    }
}

/// Whether `actor` may hand `target` to a member of `organization`.
///
/// The target must be assignable in the organization's industry and must not
/// carry any permission the actor itself lacks.
pub fn can_grant_role(actor: Role, target: Role, organization: &Organization) -> bool {
    if target.is_platform() || !organization.industry_type.assignable_roles().contains(&target) {
        return false;
    }
    let granted = role_permissions(actor);
    role_permissions(target).iter().all(|p| granted.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IndustryType, OrganizationType, SubscriptionTier};

    fn org(industry: IndustryType) -> Organization {
        Organization::provisioned(
            "Org".into(),
            "ORG".into(),
            OrganizationType::Private,
            industry,
            SubscriptionTier::Basic,
            Utc::now(),
        )
    }

    #[test]
    fn email_is_lower_cased() {
        assert_eq!(normalize_email(" Admin@School.ORG ").unwrap(), "admin@school.org");
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
    }

    #[test]
    fn profile_never_contains_the_hash() {
        let account = UserAccount::new(
            "a@b.co".into(),
            "$argon2id$secret".into(),
            "A B".into(),
            Role::User,
            None,
            Utc::now(),
        );
        let json = serde_json::to_string(&account.profile(None)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("fullName"));
    }

    #[test]
    fn admins_grant_within_their_industry() {
        let school = org(IndustryType::Education);
        assert!(can_grant_role(Role::SchoolAdmin, Role::Teacher, &school));
        assert!(can_grant_role(Role::SchoolAdmin, Role::SchoolAdmin, &school));
        assert!(!can_grant_role(Role::SchoolAdmin, Role::Doctor, &school));
        assert!(!can_grant_role(Role::SchoolAdmin, Role::SuperAdmin, &school));
    }

    #[test]
    fn no_privilege_escalation() {
        let business = org(IndustryType::Business);
        assert!(can_grant_role(Role::Hr, Role::Officer, &business));
        assert!(!can_grant_role(Role::Hr, Role::OrgAdmin, &business));
        assert!(!can_grant_role(Role::Hr, Role::Reviewer, &business));
    }
}
