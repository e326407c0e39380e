//! Shared configuration and common types for the Connect server
//!
//! This crate provides functionality used across all server crates:
//! - Configuration types and the layered loader
//! - The error body returned by every API endpoint
//! - Common response types

pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, BroadcastConfig, ConfigError, CorsConfig, DatabaseConfig,
    Environment, JwtConfig, LedgerCleanupConfig, LogFormat, LoggingConfig, ServerConfig, StorageBackend,
};
pub use errors::{error_codes, ErrorResponse};
pub use types::{HealthResponse, HealthStatus, MessageResponse};
