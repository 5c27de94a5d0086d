use orgdesk_auth::{Principal, Role};
use orgdesk_core::{OrganizationId, UserId};

/// Authenticated caller for a request, inserted by the auth middleware.
///
/// Immutable; the organization comes from the token, never from the request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    /// `None` for platform accounts and applicants.
    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.principal.organization_id
    }
}
