//! Refresh token ledger: the allow-list of live refresh token identifiers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::token::{LedgerEntry, TokenId};
use crate::errors::DomainError;

/// Persisted allow-list deciding whether a verified refresh token may still be used
///
/// A refresh token is usable only while a row with its identifier and its
/// subject exists here. Rows are created on login and on every rotation,
/// and removed on rotation, logout, or by the reaper once they are older
/// than the refresh token lifetime.
///
/// # Concurrency
/// `rotate` must be atomic per token identifier: when two callers rotate
/// the same identifier concurrently, exactly one observes `Ok(true)`.
#[async_trait]
pub trait RefreshLedger: Send + Sync {
    /// Insert a new row
    ///
    /// # Arguments
    /// * `entry` - Row to insert; its identifier must not already exist
    ///
    /// # Returns
    /// * `Ok(())` - Row stored
    /// * `Err(DomainError)` - Duplicate identifier or storage failure
    async fn record(&self, entry: LedgerEntry) -> Result<(), DomainError>;

    /// Check that a row exists for this identifier and subject
    ///
    /// Both fields must match, so an identifier collision across subjects
    /// never grants access.
    async fn is_live(&self, token_id: &TokenId, user_id: Uuid) -> Result<bool, DomainError>;

    /// Delete a row; deleting a missing row is not an error
    ///
    /// # Returns
    /// * `Ok(true)` - A row was removed
    /// * `Ok(false)` - Nothing to remove
    async fn revoke(&self, token_id: &TokenId) -> Result<bool, DomainError>;

    /// Delete every row owned by `user_id`
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows removed
    async fn revoke_all_for(&self, user_id: Uuid) -> Result<usize, DomainError>;

    /// Replace the row `old` (owned by `user_id`) with `replacement` in one step
    ///
    /// # Returns
    /// * `Ok(true)` - `old` was live and has been replaced
    /// * `Ok(false)` - `old` was not live for `user_id`; nothing changed
    /// * `Err(DomainError)` - Storage failure; nothing changed
    async fn rotate(
        &self,
        old: &TokenId,
        user_id: Uuid,
        replacement: LedgerEntry,
    ) -> Result<bool, DomainError>;

    /// Delete rows created before `cutoff`
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows removed
    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError>;
}
