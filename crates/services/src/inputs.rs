//! Validated inputs accepted by the services.
//!
//! The API deserializes request bodies straight into these; services call
//! `validate()` before any storage access.

use serde::Deserialize;
use validator::Validate;

use orgdesk_auth::Role;
use orgdesk_invoicing::PaymentMethod;
use orgdesk_tenancy::{IndustryType, OrganizationType, RegistrationStatus};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 1024))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterApplicantInput {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 1024, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRegistrationInput {
    #[validate(length(min = 1, max = 200))]
    pub org_name: String,
    pub org_type: OrganizationType,
    /// Normalized by the provisioner (trim, upper-case, charset).
    #[validate(length(min = 2, max = 32))]
    pub org_code: String,
    #[validate(length(min = 1, max = 120))]
    pub contact_person: String,
    #[validate(email)]
    pub official_email: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    pub industry_type: IndustryType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusInput {
    pub status: RegistrationStatus,
    /// Tier name; unknown names are a validation error.
    pub assigned_tier: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPaymentInput {
    pub payment_method: PaymentMethod,
    #[validate(length(min = 1, max = 100))]
    pub transaction_number: String,
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTierInput {
    pub tier: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberInput {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_input_reports_field_errors() {
        let input: SubmitRegistrationInput = serde_json::from_value(serde_json::json!({
            "orgName": "",
            "orgType": "PRIVATE",
            "orgCode": "GFA",
            "contactPerson": "Ada",
            "officialEmail": "not-an-email",
            "industryType": "EDUCATION"
        }))
        .unwrap();

        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("org_name"));
        assert!(fields.contains_key("official_email"));
        assert!(!fields.contains_key("org_code"));
    }

    #[test]
    fn applicant_password_needs_eight_characters() {
        let input = RegisterApplicantInput {
            full_name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "short".into(),
        };
        assert!(input.validate().unwrap_err().field_errors().contains_key("password"));
    }

    #[test]
    fn unknown_enum_values_fail_to_deserialize() {
        let result: Result<SubmitPaymentInput, _> = serde_json::from_value(serde_json::json!({
            "paymentMethod": "BARTER",
            "transactionNumber": "X"
        }));
        assert!(result.is_err());
    }
}
