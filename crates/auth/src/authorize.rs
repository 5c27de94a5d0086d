use serde::Serialize;
use thiserror::Error;

use orgdesk_core::{OrganizationId, UserId};

use crate::policy::{has_permission, role_permissions, roles_granting};
use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(Permission),
}

/// Authorize a principal for a single permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: Permission) -> Result<(), AuthzError> {
    if has_permission(principal.role, required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
///
/// Answers "why was this request allowed/denied?" for the RBAC inspection
/// endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationExplanation {
    pub required_permission: Permission,
    pub granted: bool,
    pub reason: String,
    pub principal: PrincipalState,
    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalState {
    pub user_id: UserId,
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
    pub effective_permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DenialReason {
    pub message: String,
    /// Roles whose permission set contains the required permission.
    pub granting_roles: Vec<Role>,
}

/// Explain why an authorization decision was made (or would be made).
pub fn explain_authorization(
    principal: &Principal,
    required: Permission,
) -> AuthorizationExplanation {
    let effective_permissions = role_permissions(principal.role).to_vec();
    let granted = has_permission(principal.role, required);

    let state = PrincipalState {
        user_id: principal.user_id,
        role: principal.role,
        organization_id: principal.organization_id,
        effective_permissions,
    };

    if granted {
        AuthorizationExplanation {
            required_permission: required,
            granted,
            reason: format!("role {} lists permission '{}'", principal.role, required),
            principal: state,
            denial_reason: None,
        }
    } else {
        AuthorizationExplanation {
            required_permission: required,
            granted,
            reason: format!(
                "role {} does not list permission '{}'",
                principal.role, required
            ),
            principal: state,
            denial_reason: Some(DenialReason {
                message: format!("Missing required permission: '{}'", required),
                granting_roles: roles_granting(required),
            }),
        }
    }
}

/// Role definition with its granted permissions (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: Role,
    pub description: &'static str,
    pub permissions: Vec<Permission>,
}

/// Permission definition (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct PermissionDefinition {
    pub name: Permission,
    pub category: &'static str,
    pub roles: Vec<Role>,
}

/// Catalogue of every role and permission known to the policy table.
#[derive(Debug, Clone, Serialize)]
pub struct RbacRegistry {
    pub roles: Vec<RoleDefinition>,
    pub permissions: Vec<PermissionDefinition>,
}

impl RbacRegistry {
    pub fn build() -> Self {
        let roles = Role::ALL
            .iter()
            .map(|role| RoleDefinition {
                name: *role,
                description: role.description(),
                permissions: role_permissions(*role).to_vec(),
            })
            .collect();

        let permissions = Permission::ALL
            .iter()
            .map(|perm| PermissionDefinition {
                name: *perm,
                category: perm.category(),
                roles: roles_granting(*perm),
            })
            .collect();

        Self { roles, permissions }
    }

    pub fn role(&self, role: Role) -> Option<&RoleDefinition> {
        self.roles.iter().find(|r| r.name == role)
    }
}
