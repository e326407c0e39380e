//! Authentication and session configuration

use serde::{Deserialize, Serialize};
use std::env;

use super::ConfigError;

const DEFAULT_ACCESS_SECRET: &str = "change-me-access-secret";
const DEFAULT_REFRESH_SECRET: &str = "change-me-refresh-secret";

/// JWT signing configuration for access and refresh tokens
///
/// Access and refresh tokens are signed with distinct secrets so that a
/// token of one kind can never verify as the other.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Secret for signing access tokens
    pub access_secret: String,

    /// Secret for signing refresh tokens
    pub refresh_secret: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl: i64,

    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl: i64,

    /// JWT issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// JWT audience claim
    #[serde(default = "default_audience")]
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: String::from(DEFAULT_ACCESS_SECRET),
            refresh_secret: String::from(DEFAULT_REFRESH_SECRET),
            access_token_ttl: default_access_ttl(),
            refresh_token_ttl: default_refresh_ttl(),
            issuer: default_issuer(),
            audience: default_audience(),
        }
    }
}

impl JwtConfig {
    /// Create a configuration with explicit secrets and default lifetimes
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            ..Default::default()
        }
    }

    /// Set access token lifetime in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_ttl = minutes * 60;
        self
    }

    /// Set refresh token lifetime in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_ttl = days * 86400;
        self
    }

    /// Check if either secret is still the built-in placeholder
    pub fn is_using_default_secrets(&self) -> bool {
        self.access_secret == DEFAULT_ACCESS_SECRET || self.refresh_secret == DEFAULT_REFRESH_SECRET
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err(ConfigError::Invalid("JWT secrets must not be empty".to_string()));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::Invalid(
                "access and refresh secrets must differ".to_string(),
            ));
        }
        if self.access_token_ttl <= 0 || self.refresh_token_ttl <= 0 {
            return Err(ConfigError::Invalid("token lifetimes must be positive".to_string()));
        }
        if self.access_token_ttl >= self.refresh_token_ttl {
            return Err(ConfigError::Invalid(
                "access tokens must expire before refresh tokens".to_string(),
            ));
        }
        Ok(())
    }
}

/// Refresh ledger cleanup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerCleanupConfig {
    /// Run the background reaper
    #[serde(default = "default_cleanup_enabled")]
    pub enabled: bool,

    /// Interval between sweeps in seconds
    #[serde(default = "default_cleanup_interval")]
    pub interval_seconds: u64,
}

impl Default for LedgerCleanupConfig {
    fn default() -> Self {
        Self {
            enabled: default_cleanup_enabled(),
            interval_seconds: default_cleanup_interval(),
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt: JwtConfig,

    /// bcrypt work factor for password hashes
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default)]
    pub ledger_cleanup: LedgerCleanupConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            bcrypt_cost: default_bcrypt_cost(),
            ledger_cleanup: LedgerCleanupConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Overlay `JWT_SECRET`, `REFRESH_SECRET` and `BCRYPT_COST` onto `base`
    pub fn from_env(mut base: Self) -> Self {
        if let Ok(secret) = env::var("JWT_SECRET") {
            base.jwt.access_secret = secret;
        }
        if let Ok(secret) = env::var("REFRESH_SECRET") {
            base.jwt.refresh_secret = secret;
        }
        if let Some(cost) = env::var("BCRYPT_COST").ok().and_then(|v| v.parse().ok()) {
            base.bcrypt_cost = cost;
        }
        base
    }
}

fn default_access_ttl() -> i64 {
    900 // 15 minutes
}

fn default_refresh_ttl() -> i64 {
    30 * 86400 // 30 days
}

fn default_issuer() -> String {
    String::from("connect")
}

fn default_audience() -> String {
    String::from("connect-clients")
}

fn default_bcrypt_cost() -> u32 {
    12
}

fn default_cleanup_enabled() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_config_defaults() {
        let config = JwtConfig::default();
        assert_eq!(config.access_token_ttl, 900);
        assert_eq!(config.refresh_token_ttl, 2_592_000);
        assert!(config.is_using_default_secrets());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_jwt_config_builder() {
        let config = JwtConfig::new("a", "b")
            .with_access_expiry_minutes(5)
            .with_refresh_expiry_days(7);
        assert_eq!(config.access_token_ttl, 300);
        assert_eq!(config.refresh_token_ttl, 604_800);
        assert!(!config.is_using_default_secrets());
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let config = JwtConfig::new("same", "same");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_access_must_be_shorter_than_refresh() {
        let mut config = JwtConfig::new("a", "b");
        config.access_token_ttl = config.refresh_token_ttl;
        assert!(config.validate().is_err());
    }
}
