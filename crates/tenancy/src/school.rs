use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orgdesk_core::{OrganizationId, SchoolProfileId};

use crate::organization::{IndustryType, Organization};

/// Academic profile attached 1:1 to an education organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolProfile {
    pub id: SchoolProfileId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl SchoolProfile {
    /// The profile to create alongside `org`, if its industry needs one.
    pub fn for_organization(org: &Organization, now: DateTime<Utc>) -> Option<Self> {
        (org.industry_type == IndustryType::Education).then(|| Self {
            id: SchoolProfileId::new(),
            organization_id: org.id,
            name: org.name.clone(),
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrganizationType, SubscriptionTier};

    fn org(industry: IndustryType) -> Organization {
        Organization::provisioned(
            "Org".into(),
            "ORG".into(),
            OrganizationType::Public,
            industry,
            SubscriptionTier::Basic,
            Utc::now(),
        )
    }

    #[test]
    fn only_education_gets_a_profile() {
        let school = org(IndustryType::Education);
        let profile = SchoolProfile::for_organization(&school, Utc::now()).unwrap();
        assert_eq!(profile.organization_id, school.id);

        assert!(SchoolProfile::for_organization(&org(IndustryType::Healthcare), Utc::now()).is_none());
    }
}
