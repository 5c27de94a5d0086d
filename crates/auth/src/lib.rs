//! `orgdesk-auth`: identity, credentials and role-based authorization.
//!
//! Pure policy and crypto: nothing here touches HTTP or storage.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod password;
pub mod permissions;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod token;

pub use authorize::{
    AuthorizationExplanation, AuthzError, RbacRegistry, authorize, explain_authorization,
};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use error::AuthError;
pub use password::{
    generate_temporary_password, hash_password, verify_dummy_password, verify_password,
};
pub use permissions::Permission;
pub use policy::{has_permission, has_permission_named, role_permissions};
pub use principal::Principal;
pub use roles::Role;
pub use token::{Authenticator, DEFAULT_TOKEN_TTL_HOURS, Hs256TokenCodec, JwtValidator};
