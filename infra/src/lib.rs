//! # Infrastructure Layer
//!
//! Concrete storage for the Connect backend. Every repository trait from
//! `cn_core` has two implementations:
//!
//! - **Database**: MySQL through SQLx, with embedded migrations
//! - **Memory**: process-local maps for development and tests

pub mod database;
pub mod memory;

pub use database::{
    DatabasePool, MySqlPostRepository, MySqlRefreshLedger, MySqlUserDirectory, PoolStatistics,
};
pub use memory::{InMemoryPostRepository, InMemoryRefreshLedger, InMemoryUserDirectory};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
