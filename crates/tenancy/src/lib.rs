//! Tenancy domain module (organizations, members, registration requests).
//!
//! Deterministic rules only: no IO, no HTTP, no storage. Services load the
//! records, ask these types what to do, and persist the result.

pub mod organization;
pub mod registration;
pub mod school;
pub mod user;

pub use organization::{
    IndustryType, Organization, OrganizationStatus, OrganizationType, SUBSCRIPTION_PERIOD_DAYS,
    SubscriptionTier, normalize_org_code,
};
pub use registration::{
    RegistrationError, RegistrationRequest, RegistrationStatus, TransitionPlan, plan_transition,
};
pub use school::SchoolProfile;
pub use user::{OrganizationSummary, UserAccount, UserProfile, can_grant_role, normalize_email};
