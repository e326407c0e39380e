//! MySQL repository implementations
//!
//! Ids are stored as `CHAR(36)` strings and timestamps as `DATETIME(6)` in UTC.

mod ledger_repository_impl;
mod post_repository_impl;
mod user_repository_impl;

pub use ledger_repository_impl::MySqlRefreshLedger;
pub use post_repository_impl::MySqlPostRepository;
pub use user_repository_impl::MySqlUserDirectory;

use cn_core::errors::DomainError;
use uuid::Uuid;

/// Wrap an SQLx failure with the operation that hit it
pub(crate) fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    tracing::error!("{}: {}", context, e);
    DomainError::internal(format!("{}: {}", context, e))
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(value).map_err(|e| DomainError::internal(format!("Invalid UUID in {}: {}", column, e)))
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map_or(false, |db| db.is_unique_violation())
}

/// `?, ?, ?` with `n` placeholders
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
