use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Permission token.
///
/// Permissions are a closed set of opaque capability names (e.g.
/// `manage_students`). Routes declare the token they require; the policy table
/// decides which roles hold it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Platform
    ManageOrganizations,
    ViewOrganizations,
    ManageRegistrations,
    ApprovePayments,

    // Organization administration
    ManageUsers,
    ViewUsers,
    ViewRoles,
    ManageBilling,
    ManageSettings,
    ViewReports,

    // Letters
    ManageLetters,
    ViewLetters,
    ApproveLetters,
    ManageTemplates,

    // Applications
    SubmitApplication,
    ViewApplications,
    ManageApplications,

    // Education
    ManageStudents,
    ViewStudents,
    ManageTeachers,
    ManageClasses,
    ManageGrades,
    ViewGrades,
    ManageAttendance,
    ViewAttendance,

    // Healthcare
    ManagePatients,
    ViewPatients,
    ManageAppointments,
    ViewAppointments,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::ManageOrganizations,
        Permission::ViewOrganizations,
        Permission::ManageRegistrations,
        Permission::ApprovePayments,
        Permission::ManageUsers,
        Permission::ViewUsers,
        Permission::ViewRoles,
        Permission::ManageBilling,
        Permission::ManageSettings,
        Permission::ViewReports,
        Permission::ManageLetters,
        Permission::ViewLetters,
        Permission::ApproveLetters,
        Permission::ManageTemplates,
        Permission::SubmitApplication,
        Permission::ViewApplications,
        Permission::ManageApplications,
        Permission::ManageStudents,
        Permission::ViewStudents,
        Permission::ManageTeachers,
        Permission::ManageClasses,
        Permission::ManageGrades,
        Permission::ViewGrades,
        Permission::ManageAttendance,
        Permission::ViewAttendance,
        Permission::ManagePatients,
        Permission::ViewPatients,
        Permission::ManageAppointments,
        Permission::ViewAppointments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageOrganizations => "manage_organizations",
            Permission::ViewOrganizations => "view_organizations",
            Permission::ManageRegistrations => "manage_registrations",
            Permission::ApprovePayments => "approve_payments",
            Permission::ManageUsers => "manage_users",
            Permission::ViewUsers => "view_users",
            Permission::ViewRoles => "view_roles",
            Permission::ManageBilling => "manage_billing",
            Permission::ManageSettings => "manage_settings",
            Permission::ViewReports => "view_reports",
            Permission::ManageLetters => "manage_letters",
            Permission::ViewLetters => "view_letters",
            Permission::ApproveLetters => "approve_letters",
            Permission::ManageTemplates => "manage_templates",
            Permission::SubmitApplication => "submit_application",
            Permission::ViewApplications => "view_applications",
            Permission::ManageApplications => "manage_applications",
            Permission::ManageStudents => "manage_students",
            Permission::ViewStudents => "view_students",
            Permission::ManageTeachers => "manage_teachers",
            Permission::ManageClasses => "manage_classes",
            Permission::ManageGrades => "manage_grades",
            Permission::ViewGrades => "view_grades",
            Permission::ManageAttendance => "manage_attendance",
            Permission::ViewAttendance => "view_attendance",
            Permission::ManagePatients => "manage_patients",
            Permission::ViewPatients => "view_patients",
            Permission::ManageAppointments => "manage_appointments",
            Permission::ViewAppointments => "view_appointments",
        }
    }

    /// Functional area of the permission (for RBAC listings).
    pub fn category(&self) -> &'static str {
        match self {
            Permission::ManageOrganizations
            | Permission::ViewOrganizations
            | Permission::ManageRegistrations
            | Permission::ApprovePayments => "platform",
            Permission::ManageUsers
            | Permission::ViewUsers
            | Permission::ViewRoles
            | Permission::ManageBilling
            | Permission::ManageSettings
            | Permission::ViewReports => "organization",
            Permission::ManageLetters
            | Permission::ViewLetters
            | Permission::ApproveLetters
            | Permission::ManageTemplates => "letters",
            Permission::SubmitApplication
            | Permission::ViewApplications
            | Permission::ManageApplications => "applications",
            Permission::ManageStudents
            | Permission::ViewStudents
            | Permission::ManageTeachers
            | Permission::ManageClasses
            | Permission::ManageGrades
            | Permission::ViewGrades
            | Permission::ManageAttendance
            | Permission::ViewAttendance => "education",
            Permission::ManagePatients
            | Permission::ViewPatients
            | Permission::ManageAppointments
            | Permission::ViewAppointments => "healthcare",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a token is not part of the closed permission set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission '{0}'")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}
