//! Process configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BIND_ADDR` | `0.0.0.0:8080` |
//! | `JWT_SECRET` | insecure dev secret (logged as a warning) |
//! | `TOKEN_TTL_HOURS` | `8` (at most 720) |
//! | `DATABASE_URL` | unset: in-memory store |
//! | `BOOTSTRAP_ADMIN_EMAIL` / `BOOTSTRAP_ADMIN_PASSWORD` | unset: no platform admin seeded |

use std::net::SocketAddr;

use thiserror::Error;
use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 8;
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("{0} and {1} must be set together")]
    Incomplete(&'static str, &'static str),
}

/// Credentials of the platform operator account seeded at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                message: e.to_string(),
            })?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let token_ttl_hours = match get("TOKEN_TTL_HOURS") {
            None => DEFAULT_TOKEN_TTL_HOURS,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(hours) if (1..=MAX_TOKEN_TTL_HOURS).contains(&hours) => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "TOKEN_TTL_HOURS",
                        message: format!("expected 1 to {MAX_TOKEN_TTL_HOURS} hours, got '{raw}'"),
                    });
                }
            },
        };

        let bootstrap_admin = match (get("BOOTSTRAP_ADMIN_EMAIL"), get("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Incomplete(
                    "BOOTSTRAP_ADMIN_EMAIL",
                    "BOOTSTRAP_ADMIN_PASSWORD",
                ));
            }
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl_hours,
            database_url: get("DATABASE_URL"),
            bootstrap_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.token_ttl_hours, 8);
        assert!(cfg.database_url.is_none());
        assert!(cfg.bootstrap_admin.is_none());
    }

    #[test]
    fn explicit_values_are_used() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_HOURS", "2"),
            ("DATABASE_URL", "postgres://localhost/orgdesk"),
            ("BOOTSTRAP_ADMIN_EMAIL", "root@platform.io"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "changeme123"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.token_ttl_hours, 2);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/orgdesk"));
        assert_eq!(cfg.bootstrap_admin.unwrap().email, "root@platform.io");
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            config(&[("TOKEN_TTL_HOURS", "0")]),
            Err(ConfigError::Invalid { key: "TOKEN_TTL_HOURS", .. })
        ));
        assert!(matches!(
            config(&[("BIND_ADDR", "nope")]),
            Err(ConfigError::Invalid { key: "BIND_ADDR", .. })
        ));
        assert!(matches!(
            config(&[("BOOTSTRAP_ADMIN_EMAIL", "root@platform.io")]),
            Err(ConfigError::Incomplete(..))
        ));
    }

    #[test]
    fn token_ttl_is_capped() {
        assert_eq!(config(&[("TOKEN_TTL_HOURS", "720")]).unwrap().token_ttl_hours, 720);
        for raw in ["721", "9223372036854775807", "-1"] {
            assert!(
                matches!(
                    config(&[("TOKEN_TTL_HOURS", raw)]),
                    Err(ConfigError::Invalid { key: "TOKEN_TTL_HOURS", .. })
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = config(&[("JWT_SECRET", "topsecret")]).unwrap();
        assert!(!format!("{cfg:?}").contains("topsecret"));
    }
}
