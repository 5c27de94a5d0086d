use core::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use orgdesk_auth::Role;
use orgdesk_core::{DomainError, OrganizationId};

/// Length of one paid subscription period.
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

const ORG_CODE_MIN_LEN: usize = 2;
const ORG_CODE_MAX_LEN: usize = 16;

/// Legal form of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationType {
    Private,
    Public,
    Government,
    NonProfit,
}

impl OrganizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationType::Private => "PRIVATE",
            OrganizationType::Public => "PUBLIC",
            OrganizationType::Government => "GOVERNMENT",
            OrganizationType::NonProfit => "NON_PROFIT",
        }
    }
}

impl FromStr for OrganizationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRIVATE" => Ok(OrganizationType::Private),
            "PUBLIC" => Ok(OrganizationType::Public),
            "GOVERNMENT" => Ok(OrganizationType::Government),
            "NON_PROFIT" => Ok(OrganizationType::NonProfit),
            other => Err(DomainError::validation(format!(
                "unknown organization type '{other}'"
            ))),
        }
    }
}

/// Sector an organization operates in. Drives which administrator role and
/// which auxiliary records provisioning creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndustryType {
    Education,
    Healthcare,
    Government,
    Ngo,
    Business,
    Other,
}

impl IndustryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndustryType::Education => "EDUCATION",
            IndustryType::Healthcare => "HEALTHCARE",
            IndustryType::Government => "GOVERNMENT",
            IndustryType::Ngo => "NGO",
            IndustryType::Business => "BUSINESS",
            IndustryType::Other => "OTHER",
        }
    }

    /// Role given to the first account of a freshly provisioned organization.
    pub fn administrator_role(&self) -> Role {
        match self {
            IndustryType::Education => Role::SchoolAdmin,
            IndustryType::Healthcare => Role::HospitalAdmin,
            _ => Role::OrgAdmin,
        }
    }

    /// Roles an organization administrator may hand out to members.
    pub fn assignable_roles(&self) -> &'static [Role] {
        match self {
            IndustryType::Education => &[
                Role::SchoolAdmin,
                Role::Teacher,
                Role::Student,
                Role::Parent,
                Role::Hr,
                Role::Officer,
                Role::Reviewer,
                Role::User,
            ],
            IndustryType::Healthcare => &[
                Role::HospitalAdmin,
                Role::Doctor,
                Role::Nurse,
                Role::Patient,
                Role::Hr,
                Role::Officer,
                Role::Reviewer,
                Role::User,
            ],
            _ => &[
                Role::OrgAdmin,
                Role::Hr,
                Role::Officer,
                Role::Reviewer,
                Role::User,
            ],
        }
    }
}

impl FromStr for IndustryType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EDUCATION" => Ok(IndustryType::Education),
            "HEALTHCARE" => Ok(IndustryType::Healthcare),
            "GOVERNMENT" => Ok(IndustryType::Government),
            "NGO" => Ok(IndustryType::Ngo),
            "BUSINESS" => Ok(IndustryType::Business),
            "OTHER" => Ok(IndustryType::Other),
            other => Err(DomainError::validation(format!(
                "unknown industry type '{other}'"
            ))),
        }
    }
}

/// Subscription tier; selects the price of each billing period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionTier {
    #[default]
    Basic,
    Standard,
    Premium,
    Enterprise,
}

impl SubscriptionTier {
    pub const ALL: &'static [SubscriptionTier] = &[
        SubscriptionTier::Basic,
        SubscriptionTier::Standard,
        SubscriptionTier::Premium,
        SubscriptionTier::Enterprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Basic => "BASIC",
            SubscriptionTier::Standard => "STANDARD",
            SubscriptionTier::Premium => "PREMIUM",
            SubscriptionTier::Enterprise => "ENTERPRISE",
        }
    }
}

impl core::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionTier::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown subscription tier '{s}'")))
    }
}

/// Lapsed subscriptions are tracked by `is_active` and the expiration date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationStatus {
    Approved,
}

impl OrganizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationStatus::Approved => "APPROVED",
        }
    }
}

impl FromStr for OrganizationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVED" => Ok(OrganizationStatus::Approved),
            other => Err(DomainError::validation(format!(
                "unknown organization status '{other}'"
            ))),
        }
    }
}

/// Normalize a tenant code: trimmed, upper-cased, 2-16 chars of `A-Z0-9-`.
///
/// The normalized code is the namespace of every identifier minted for the
/// organization, so it must be stable and safe to embed in `A/B/C` formats.
pub fn normalize_org_code(raw: &str) -> Result<String, DomainError> {
    let code = raw.trim().to_ascii_uppercase();
    let len = code.chars().count();
    if !(ORG_CODE_MIN_LEN..=ORG_CODE_MAX_LEN).contains(&len) {
        return Err(DomainError::validation(format!(
            "organization code must be {ORG_CODE_MIN_LEN}-{ORG_CODE_MAX_LEN} characters"
        )));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(DomainError::validation(
            "organization code may only contain letters, digits and '-'",
        ));
    }
    Ok(code)
}

/// A tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    /// Normalized, globally unique, immutable.
    pub code: String,
    #[serde(rename = "type")]
    pub org_type: OrganizationType,
    pub industry_type: IndustryType,
    pub subscription_tier: SubscriptionTier,
    pub status: OrganizationStatus,
    pub is_active: bool,
    pub expiration_date: Option<DateTime<Utc>>,
    pub parent_organization_id: Option<OrganizationId>,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    /// A freshly approved organization with one subscription period granted.
    pub fn provisioned(
        name: String,
        code: String,
        org_type: OrganizationType,
        industry_type: IndustryType,
        tier: SubscriptionTier,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrganizationId::new(),
            name,
            code,
            org_type,
            industry_type,
            subscription_tier: tier,
            status: OrganizationStatus::Approved,
            is_active: true,
            expiration_date: Some(now + Duration::days(SUBSCRIPTION_PERIOD_DAYS)),
            parent_organization_id: None,
            created_at: now,
        }
    }

    /// Expired once `now` has reached the expiration date.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|exp| exp <= now)
    }

    /// Whether the tenant has to pay before continuing to use the platform.
    pub fn requires_renewal(&self, now: DateTime<Utc>) -> bool {
        !self.is_active || self.is_expired(now)
    }

    /// Grant a new subscription period on `tier` starting at `now`.
    pub fn reactivate(&mut self, tier: SubscriptionTier, now: DateTime<Utc>) {
        self.is_active = true;
        self.status = OrganizationStatus::Approved;
        self.subscription_tier = tier;
        self.expiration_date = Some(now + Duration::days(SUBSCRIPTION_PERIOD_DAYS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn org(now: DateTime<Utc>) -> Organization {
        Organization::provisioned(
            "Greenfield Academy".to_string(),
            "GFA".to_string(),
            OrganizationType::Private,
            IndustryType::Education,
            SubscriptionTier::default(),
            now,
        )
    }

    #[test]
    fn code_is_trimmed_and_upper_cased() {
        assert_eq!(normalize_org_code("  gfa-01 ").unwrap(), "GFA-01");
    }

    #[test]
    fn code_length_and_alphabet_are_enforced() {
        assert!(normalize_org_code("A").is_err());
        assert!(normalize_org_code("ABCDEFGHIJKLMNOPQ").is_err());
        assert!(normalize_org_code("AB/C").is_err());
        assert!(normalize_org_code("AB C").is_err());
        assert!(normalize_org_code("ÄB").is_err());
    }

    #[test]
    fn provisioned_org_is_active_for_one_period() {
        let now = Utc::now();
        let org = org(now);
        assert!(org.is_active);
        assert_eq!(org.status, OrganizationStatus::Approved);
        assert_eq!(org.subscription_tier, SubscriptionTier::Basic);
        assert_eq!(org.expiration_date, Some(now + Duration::days(30)));
        assert!(!org.requires_renewal(now));
    }

    #[test]
    fn expiration_boundary_counts_as_expired() {
        let now = Utc::now();
        let mut org = org(now);
        org.expiration_date = Some(now);
        assert!(org.is_expired(now));
        assert!(org.requires_renewal(now));
    }

    #[test]
    fn reactivation_extends_from_now() {
        let now = Utc::now();
        let mut org = org(now - Duration::days(60));
        org.is_active = false;
        org.reactivate(SubscriptionTier::Premium, now);
        assert!(org.is_active);
        assert_eq!(org.subscription_tier, SubscriptionTier::Premium);
        assert_eq!(org.expiration_date, Some(now + Duration::days(30)));
    }

    #[test]
    fn administrator_role_follows_industry() {
        assert_eq!(IndustryType::Education.administrator_role(), Role::SchoolAdmin);
        assert_eq!(IndustryType::Healthcare.administrator_role(), Role::HospitalAdmin);
        assert_eq!(IndustryType::Ngo.administrator_role(), Role::OrgAdmin);
        for industry in [IndustryType::Education, IndustryType::Healthcare, IndustryType::Business] {
            assert!(!industry.assignable_roles().contains(&Role::SuperAdmin));
            assert!(industry.assignable_roles().contains(&industry.administrator_role()));
        }
    }

    #[test]
    fn enum_wire_names_match_as_str() {
        assert_eq!(
            serde_json::to_value(OrganizationType::NonProfit).unwrap(),
            serde_json::json!("NON_PROFIT")
        );
        assert_eq!("ENTERPRISE".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::Enterprise);
        assert!("GOLD".parse::<SubscriptionTier>().is_err());
        assert_eq!("NGO".parse::<IndustryType>().unwrap(), IndustryType::Ngo);
        assert_eq!("APPROVED".parse::<OrganizationStatus>().unwrap(), OrganizationStatus::Approved);
        assert!("SUSPENDED".parse::<OrganizationStatus>().is_err());
    }

    proptest! {
        #[test]
        fn normalized_codes_are_fixed_points(raw in "[a-zA-Z0-9-]{2,16}") {
            let code = normalize_org_code(&raw).unwrap();
            prop_assert_eq!(normalize_org_code(&code).unwrap(), code.clone());
            prop_assert!(!code.chars().any(|c| c.is_ascii_lowercase()));
        }
    }
}
