//! HS256 access token issuance/verification and bearer authentication.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use orgdesk_core::{OrganizationId, UserId};

use crate::claims::{JwtClaims, validate_claims};
use crate::error::AuthError;
use crate::{Principal, Role};

/// Default access token lifetime.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 8;

/// Verifies encoded tokens and yields their claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError>;
}

/// Stateless HS256 token codec (no server-side session).
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a signed token for `{user_id, role, organization_id}`.
    pub fn issue(
        &self,
        user_id: UserId,
        role: Role,
        organization_id: Option<OrganizationId>,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = JwtClaims {
            sub: user_id,
            role,
            organization_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }
}

impl JwtValidator for Hs256TokenCodec {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        let claims = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        validate_claims(&claims, now).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(claims)
    }
}

/// Resolves the caller identity from an `Authorization` header value.
pub struct Authenticator<V: ?Sized> {
    validator: std::sync::Arc<V>,
}

impl<V: JwtValidator + ?Sized> Authenticator<V> {
    pub fn new(validator: std::sync::Arc<V>) -> Self {
        Self { validator }
    }

    /// `Bearer <token>` → [`Principal`].
    ///
    /// Absent header, wrong scheme or empty token → `MissingToken`; anything
    /// that fails verification → `InvalidToken`.
    pub fn authenticate(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Principal, AuthError> {
        let token = extract_bearer(authorization).ok_or(AuthError::MissingToken)?;
        let claims = self.validator.validate(token, now)?;
        Ok(Principal::from_claims(&claims))
    }
}

fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}
