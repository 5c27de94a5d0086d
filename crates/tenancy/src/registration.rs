//! Registration request lifecycle.
//!
//! `PENDING → REVIEWING → {APPROVED | REJECTED}`. APPROVED is terminal;
//! REJECTED may still be approved later, which retries provisioning.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use orgdesk_core::{DomainError, RegistrationId, UserId};

use crate::organization::{IndustryType, OrganizationType, SubscriptionTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Pending,
    Reviewing,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "PENDING",
            RegistrationStatus::Reviewing => "REVIEWING",
            RegistrationStatus::Approved => "APPROVED",
            RegistrationStatus::Rejected => "REJECTED",
        }
    }

    /// Still awaiting a decision; blocks other requests for the same code/email.
    pub fn is_open(&self) -> bool {
        matches!(self, RegistrationStatus::Pending | RegistrationStatus::Reviewing)
    }
}

impl core::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RegistrationStatus::Pending),
            "REVIEWING" => Ok(RegistrationStatus::Reviewing),
            "APPROVED" => Ok(RegistrationStatus::Approved),
            "REJECTED" => Ok(RegistrationStatus::Rejected),
            other => Err(DomainError::validation(format!(
                "unknown registration status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("registration request is already approved")]
    AlreadyApproved,

    #[error("cannot move registration request from {from} to {to}")]
    InvalidTransition {
        from: RegistrationStatus,
        to: RegistrationStatus,
    },
}

/// What a status change requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Persist the new status (and reviewer/tier) only.
    StatusOnly,
    /// Create the organization and its administrator in the same transaction.
    Provision,
}

/// Decide how `current → target` is handled, without touching storage.
pub fn plan_transition(
    current: RegistrationStatus,
    target: RegistrationStatus,
) -> Result<TransitionPlan, RegistrationError> {
    use RegistrationStatus::*;

    match (current, target) {
        (Approved, Approved) => Err(RegistrationError::AlreadyApproved),
        (Approved, to) | (_, to @ Pending) => Err(RegistrationError::InvalidTransition {
            from: current,
            to,
        }),
        (_, Approved) => Ok(TransitionPlan::Provision),
        (_, Reviewing | Rejected) => Ok(TransitionPlan::StatusOnly),
    }
}

/// A prospective tenant's application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub id: RegistrationId,
    pub org_name: String,
    pub org_type: OrganizationType,
    /// Normalized organization code.
    pub org_code: String,
    pub contact_person: String,
    /// Lower-cased; becomes the administrator's login.
    pub official_email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub industry_type: IndustryType,
    pub status: RegistrationStatus,
    pub assigned_tier: Option<SubscriptionTier>,
    pub reviewed_by_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegistrationRequest {
    /// Record a reviewer decision. Callers must have planned the transition.
    pub fn record_review(
        &mut self,
        status: RegistrationStatus,
        reviewer: UserId,
        tier: Option<SubscriptionTier>,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        self.reviewed_by_id = Some(reviewer);
        if tier.is_some() {
            self.assigned_tier = tier;
        }
        self.updated_at = now;
    }

    /// Tier the organization starts on when approved.
    pub fn effective_tier(&self) -> SubscriptionTier {
        self.assigned_tier.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RegistrationStatus::*;

    const ALL: [RegistrationStatus; 4] = [Pending, Reviewing, Approved, Rejected];

    #[test]
    fn approving_twice_is_reported_distinctly() {
        assert_eq!(plan_transition(Approved, Approved), Err(RegistrationError::AlreadyApproved));
    }

    #[test]
    fn approved_is_terminal() {
        for to in [Pending, Reviewing, Rejected] {
            assert_eq!(
                plan_transition(Approved, to),
                Err(RegistrationError::InvalidTransition { from: Approved, to })
            );
        }
    }

    #[test]
    fn nothing_returns_to_pending() {
        for from in [Pending, Reviewing, Rejected] {
            assert!(matches!(
                plan_transition(from, Pending),
                Err(RegistrationError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn approval_from_any_open_or_rejected_state_provisions() {
        for from in [Pending, Reviewing, Rejected] {
            assert_eq!(plan_transition(from, Approved), Ok(TransitionPlan::Provision));
        }
    }

    #[test]
    fn review_and_reject_are_status_only() {
        for from in [Pending, Reviewing, Rejected] {
            assert_eq!(plan_transition(from, Reviewing), Ok(TransitionPlan::StatusOnly));
            assert_eq!(plan_transition(from, Rejected), Ok(TransitionPlan::StatusOnly));
        }
    }

    #[test]
    fn status_names_round_trip() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<RegistrationStatus>().unwrap(), status);
        }
        assert!(Pending.is_open() && Reviewing.is_open());
        assert!(!Approved.is_open() && !Rejected.is_open());
    }

    #[test]
    fn effective_tier_defaults_to_basic() {
        let now = Utc::now();
        let mut request = RegistrationRequest {
            id: RegistrationId::new(),
            org_name: "Org".into(),
            org_type: OrganizationType::Private,
            org_code: "ORG".into(),
            contact_person: "C".into(),
            official_email: "c@org.io".into(),
            phone: None,
            address: None,
            industry_type: IndustryType::Business,
            status: Pending,
            assigned_tier: None,
            reviewed_by_id: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(request.effective_tier(), SubscriptionTier::Basic);

        request.record_review(Reviewing, UserId::new(), Some(SubscriptionTier::Premium), now);
        request.record_review(Approved, UserId::new(), None, now);
        assert_eq!(request.effective_tier(), SubscriptionTier::Premium);
    }
}
