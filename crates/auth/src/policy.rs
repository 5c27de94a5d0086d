//! Static role → permission table.
//!
//! Every role lists its permissions explicitly, even where two roles overlap.
//! There is no inheritance and no wildcard: a permission is granted only if it
//! appears in the role's own list.

use crate::{Permission, Role};

use Permission::*;

const SUPER_ADMIN: &[Permission] = &[
    ManageOrganizations,
    ViewOrganizations,
    ManageRegistrations,
    ApprovePayments,
    ViewRoles,
    ViewReports,
];

const ORG_ADMIN: &[Permission] = &[
    ManageUsers,
    ViewUsers,
    ViewRoles,
    ManageBilling,
    ManageSettings,
    ViewReports,
    ManageLetters,
    ViewLetters,
    ApproveLetters,
    ManageTemplates,
    ManageApplications,
];

const HR: &[Permission] = &[
    ManageUsers,
    ViewUsers,
    ManageLetters,
    ViewLetters,
    ManageApplications,
];

const OFFICER: &[Permission] = &[ManageLetters, ViewLetters];

const REVIEWER: &[Permission] = &[ViewLetters, ApproveLetters];

const USER: &[Permission] = &[ViewLetters];

const APPLICANT: &[Permission] = &[SubmitApplication, ViewApplications];

const SCHOOL_ADMIN: &[Permission] = &[
    ManageUsers,
    ViewUsers,
    ViewRoles,
    ManageBilling,
    ManageSettings,
    ViewReports,
    ManageLetters,
    ViewLetters,
    ApproveLetters,
    ManageTemplates,
    ManageStudents,
    ViewStudents,
    ManageTeachers,
    ManageClasses,
    ManageGrades,
    ViewGrades,
    ManageAttendance,
    ViewAttendance,
];

const TEACHER: &[Permission] = &[
    ViewStudents,
    ManageClasses,
    ManageGrades,
    ViewGrades,
    ManageAttendance,
    ViewAttendance,
    ViewLetters,
];

const STUDENT: &[Permission] = &[ViewGrades, ViewAttendance];

const PARENT: &[Permission] = &[ViewStudents, ViewGrades, ViewAttendance];

const HOSPITAL_ADMIN: &[Permission] = &[
    ManageUsers,
    ViewUsers,
    ViewRoles,
    ManageBilling,
    ManageSettings,
    ViewReports,
    ManageLetters,
    ViewLetters,
    ApproveLetters,
    ManageTemplates,
    ManagePatients,
    ViewPatients,
    ManageAppointments,
    ViewAppointments,
];

const DOCTOR: &[Permission] = &[
    ManagePatients,
    ViewPatients,
    ManageAppointments,
    ViewAppointments,
];

const NURSE: &[Permission] = &[ViewPatients, ViewAppointments];

const PATIENT: &[Permission] = &[ViewAppointments];

/// Permissions granted to `role`.
pub fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::SuperAdmin => SUPER_ADMIN,
        Role::OrgAdmin => ORG_ADMIN,
        Role::Hr => HR,
        Role::Officer => OFFICER,
        Role::Reviewer => REVIEWER,
        Role::User => USER,
        Role::Applicant => APPLICANT,
        Role::SchoolAdmin => SCHOOL_ADMIN,
        Role::Teacher => TEACHER,
        Role::Student => STUDENT,
        Role::Parent => PARENT,
        Role::HospitalAdmin => HOSPITAL_ADMIN,
        Role::Doctor => DOCTOR,
        Role::Nurse => NURSE,
        Role::Patient => PATIENT,
    }
}

/// `true` iff `permission` is listed for `role`.
pub fn has_permission(role: Role, permission: Permission) -> bool {
    role_permissions(role).contains(&permission)
}

/// String-keyed variant of [`has_permission`] for untrusted input.
///
/// Unknown roles and unknown permission tokens are denied.
pub fn has_permission_named(role: &str, permission: &str) -> bool {
    match (role.parse::<Role>(), permission.parse::<Permission>()) {
        (Ok(role), Ok(permission)) => has_permission(role, permission),
        _ => false,
    }
}

/// Roles whose permission set includes `permission`.
pub fn roles_granting(permission: Permission) -> Vec<Role> {
    Role::ALL
        .iter()
        .copied()
        .filter(|r| has_permission(*r, permission))
        .collect()
}
