//! Credential checks and account creation outside any organization.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use orgdesk_auth::{
    AuthError, Hs256TokenCodec, Role, hash_password, verify_dummy_password, verify_password,
};
use orgdesk_infra::{CredentialStore, with_transaction};
use orgdesk_tenancy::{UserAccount, UserProfile, normalize_email};

use crate::error::{ServiceError, ServiceResult};
use crate::inputs::{LoginInput, RegisterApplicantInput};
use crate::support::read_only;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    codec: Arc<Hs256TokenCodec>,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, codec: Arc<Hs256TokenCodec>) -> Self {
        Self { store, codec }
    }

    /// Exchange email + password for a signed access token.
    ///
    /// Unknown email and wrong password are indistinguishable
    /// (`InvalidCredentials`). A disabled account is only reported as such
    /// once the password has been verified.
    #[instrument(skip(self, input), err)]
    pub async fn login(&self, input: LoginInput, now: DateTime<Utc>) -> ServiceResult<LoginResult> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();

        let found = read_only(self.store.as_ref(), |tx| {
            Box::pin(async move {
                let Some(user) = tx.find_user_by_email(&email).await? else {
                    return Ok(None);
                };
                let organization = match user.organization_id {
                    Some(id) => tx.find_organization(id).await?,
                    None => None,
                };
                Ok(Some((user, organization)))
            })
        })
        .await?;

        let Some((user, organization)) = found else {
            verify_dummy_password(&input.password);
            return Err(AuthError::InvalidCredentials.into());
        };
        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }
        if !user.is_active {
            return Err(AuthError::AccountDisabled.into());
        }

        let token = self
            .codec
            .issue(user.id, user.role, user.organization_id, now)?;
        info!(user_id = %user.id, role = %user.role, "login succeeded");

        Ok(LoginResult {
            token,
            expires_at: now + self.codec.ttl(),
            user: user.profile(organization.as_ref()),
        })
    }

    /// Public self-registration: an APPLICANT account without organization.
    #[instrument(skip(self, input), err)]
    pub async fn register_applicant(
        &self,
        input: RegisterApplicantInput,
        now: DateTime<Utc>,
    ) -> ServiceResult<UserProfile> {
        input.validate()?;
        let email = normalize_email(&input.email)?;
        let password_hash = hash_password(&input.password)?;
        let account = UserAccount::new(
            email,
            password_hash,
            input.full_name.trim().to_string(),
            Role::Applicant,
            None,
            now,
        );

        let created = with_transaction(self.store.as_ref(), |tx| {
            Box::pin(async move {
                if tx.find_user_by_email(&account.email).await?.is_some() {
                    return Err(ServiceError::DuplicateUser(format!(
                        "email '{}' is already registered",
                        account.email
                    )));
                }
                tx.insert_user(&account).await?;
                Ok(account)
            })
        })
        .await?;

        info!(user_id = %created.id, "applicant registered");
        Ok(created.profile(None))
    }

    /// Make sure the platform operator account exists. Returns `true` when it
    /// was created by this call.
    #[instrument(skip(self, password), err)]
    pub async fn ensure_platform_admin(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<bool> {
        let email = normalize_email(email)?;
        if password.chars().count() < 8 {
            return Err(ServiceError::field(
                "password",
                "bootstrap admin password must be at least 8 characters",
            ));
        }
        let password_hash = hash_password(password)?;

        with_transaction(self.store.as_ref(), |tx| {
            Box::pin(async move {
                if let Some(existing) = tx.find_user_by_email(&email).await? {
                    if existing.role != Role::SuperAdmin {
                        warn!(user_id = %existing.id, role = %existing.role,
                            "bootstrap admin email belongs to a non-platform account");
                    }
                    return Ok(false);
                }
                let admin = UserAccount::new(
                    email,
                    password_hash,
                    "Platform Administrator".to_string(),
                    Role::SuperAdmin,
                    None,
                    now,
                );
                tx.insert_user(&admin).await?;
                info!(user_id = %admin.id, "platform admin created");
                Ok(true)
            })
        })
        .await
    }
}
