//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `auth` - JWT secrets, token lifetimes, password hashing, ledger reaping
//! - `broadcast` - Real-time event hub sizing and keep-alive
//! - `database` - Storage backend selection and connection pool settings
//! - `environment` - Environment detection and logging configuration
//! - `server` - HTTP server and CORS configuration

pub mod auth;
pub mod broadcast;
pub mod database;
pub mod environment;
pub mod server;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export commonly used types
pub use auth::{AuthConfig, JwtConfig, LedgerCleanupConfig};
pub use broadcast::BroadcastConfig;
pub use database::{DatabaseConfig, StorageBackend};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use server::{CorsConfig, ServerConfig};

/// Prefix for environment variable overrides, e.g. `CONNECT__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "CONNECT";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Real-time broadcast configuration
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig::new("127.0.0.1", 5000),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            broadcast: BroadcastConfig::default(),
            cors: CorsConfig::development(),
            logging: LoggingConfig::for_environment(Environment::Development),
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig::new("0.0.0.0", 8080),
            database: DatabaseConfig::new("mysql://connect-db:3306/connect")
                .with_backend(StorageBackend::MySql)
                .with_max_connections(50),
            auth: AuthConfig::default(),
            broadcast: BroadcastConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Production),
        }
    }

    /// Base configuration for an environment
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
            Environment::Staging => {
                let mut config = Self::production();
                config.environment = Environment::Staging;
                config.logging = LoggingConfig::for_environment(Environment::Staging);
                config
            }
        }
    }

    /// Load configuration from plain environment variables
    pub fn from_env() -> Self {
        let env = Environment::from_env();
        let mut config = Self::for_environment(env);
        config.server = ServerConfig::from_env(config.server);
        config.database = DatabaseConfig::from_env(config.database);
        config.auth = AuthConfig::from_env(config.auth);
        if let Ok(client_url) = std::env::var("CLIENT_URL") {
            config.cors.allowed_origins = vec![client_url];
        }
        config
    }

    /// Load layered configuration
    ///
    /// Sources, later ones winning:
    /// 1. Built-in defaults for the detected environment (including the
    ///    plain variables read by [`AppConfig::from_env`])
    /// 2. Optional `config/<environment>.toml`
    /// 3. `CONNECT__`-prefixed environment variables (`__` separates sections)
    pub fn load() -> Result<Self, ConfigError> {
        let base = Self::from_env();
        let file = format!("config/{}", base.environment.config_file());

        let layered = ::config::Config::builder()
            .add_source(::config::Config::try_from(&base)?)
            .add_source(::config::File::with_name(&file).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: Self = layered.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.jwt.validate()?;
        if self.environment.is_production() && self.auth.jwt.is_using_default_secrets() {
            return Err(ConfigError::Invalid(
                "default JWT secrets are not allowed in production".to_string(),
            ));
        }
        if self.broadcast.subscriber_buffer == 0 {
            return Err(ConfigError::Invalid(
                "broadcast.subscriber_buffer must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults_are_valid() {
        let config = AppConfig::development();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.backend, StorageBackend::Memory);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_production_rejects_default_secrets() {
        let config = AppConfig::production();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_production_with_custom_secrets() {
        let mut config = AppConfig::production();
        config.auth.jwt = JwtConfig::new("access-secret-value", "refresh-secret-value");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_staging_uses_production_storage() {
        let config = AppConfig::for_environment(Environment::Staging);
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.database.backend, StorageBackend::MySql);
    }

    #[test]
    fn test_zero_subscriber_buffer_is_invalid() {
        let mut config = AppConfig::development();
        config.broadcast.subscriber_buffer = 0;
        assert!(config.validate().is_err());
    }
}
