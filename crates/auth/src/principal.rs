use serde::{Deserialize, Serialize};

use orgdesk_core::{OrganizationId, UserId};

use crate::{JwtClaims, Role};

/// An authenticated caller.
///
/// Built from verified token claims; carries everything downstream permission
/// checks and tenant scoping need, without any storage lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    /// `None` for platform-level accounts and applicants.
    pub organization_id: Option<OrganizationId>,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role, organization_id: Option<OrganizationId>) -> Self {
        Self {
            user_id,
            role,
            organization_id,
        }
    }

    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            organization_id: claims.organization_id,
        }
    }
}
