use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are a closed set. Each role maps to a flat, explicitly listed set of
/// permissions (see [`crate::policy`]); there is no role inheritance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Platform operator; not bound to any organization.
    SuperAdmin,
    OrgAdmin,
    Hr,
    Officer,
    Reviewer,
    User,
    /// Self-registered account without an organization.
    Applicant,
    SchoolAdmin,
    Teacher,
    Student,
    Parent,
    HospitalAdmin,
    Doctor,
    Nurse,
    Patient,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::SuperAdmin,
        Role::OrgAdmin,
        Role::Hr,
        Role::Officer,
        Role::Reviewer,
        Role::User,
        Role::Applicant,
        Role::SchoolAdmin,
        Role::Teacher,
        Role::Student,
        Role::Parent,
        Role::HospitalAdmin,
        Role::Doctor,
        Role::Nurse,
        Role::Patient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::OrgAdmin => "ORG_ADMIN",
            Role::Hr => "HR",
            Role::Officer => "OFFICER",
            Role::Reviewer => "REVIEWER",
            Role::User => "USER",
            Role::Applicant => "APPLICANT",
            Role::SchoolAdmin => "SCHOOL_ADMIN",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
            Role::Parent => "PARENT",
            Role::HospitalAdmin => "HOSPITAL_ADMIN",
            Role::Doctor => "DOCTOR",
            Role::Nurse => "NURSE",
            Role::Patient => "PATIENT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Platform administrator reviewing tenants and payments",
            Role::OrgAdmin => "Administrator of a general organization",
            Role::Hr => "Human resources staff managing members and letters",
            Role::Officer => "Staff member drafting official letters",
            Role::Reviewer => "Staff member reviewing and approving letters",
            Role::User => "Basic organization member with read-only access",
            Role::Applicant => "Self-registered applicant outside any organization",
            Role::SchoolAdmin => "Administrator of an education organization",
            Role::Teacher => "Teacher managing classes, grades and attendance",
            Role::Student => "Student with access to own records",
            Role::Parent => "Parent with access to a student's records",
            Role::HospitalAdmin => "Administrator of a healthcare organization",
            Role::Doctor => "Clinician managing patients and appointments",
            Role::Nurse => "Nursing staff with patient access",
            Role::Patient => "Patient with access to own appointments",
        }
    }

    /// Whether this role is the platform-level role that lives outside tenancy.
    pub fn is_platform(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not part of the closed role set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
