//! MySQL implementation of the RefreshLedger trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use uuid::Uuid;

use cn_core::domain::entities::token::{LedgerEntry, TokenId};
use cn_core::errors::DomainError;
use cn_core::repositories::RefreshLedger;

use super::db_error;

/// MySQL implementation of RefreshLedger
///
/// `token_id` is the primary key, so a duplicate insert fails instead of
/// overwriting. Rotation runs in a transaction whose conditional delete
/// takes the row lock; a concurrent rotation of the same id waits for it
/// and then deletes nothing.
pub struct MySqlRefreshLedger {
    pool: MySqlPool,
}

impl MySqlRefreshLedger {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshLedger for MySqlRefreshLedger {
    async fn record(&self, entry: LedgerEntry) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO refresh_tokens (token_id, user_id, created_at) VALUES (?, ?, ?)")
            .bind(entry.token_id.as_str())
            .bind(entry.user_id.to_string())
            .bind(entry.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to record refresh token", e))?;
        Ok(())
    }

    async fn is_live(&self, token_id: &TokenId, user_id: Uuid) -> Result<bool, DomainError> {
        let row = sqlx::query("SELECT 1 FROM refresh_tokens WHERE token_id = ? AND user_id = ? LIMIT 1")
            .bind(token_id.as_str())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to look up refresh token", e))?;
        Ok(row.is_some())
    }

    async fn revoke(&self, token_id: &TokenId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_id = ?")
            .bind(token_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to revoke refresh token", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to revoke user refresh tokens", e))?;
        Ok(result.rows_affected() as usize)
    }

    async fn rotate(
        &self,
        old: &TokenId,
        user_id: Uuid,
        replacement: LedgerEntry,
    ) -> Result<bool, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin rotation", e))?;

        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE token_id = ? AND user_id = ?")
            .bind(old.as_str())
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to delete rotated refresh token", e))?;

        if deleted.rows_affected() != 1 {
            tx.rollback()
                .await
                .map_err(|e| db_error("Failed to roll back rotation", e))?;
            return Ok(false);
        }

        sqlx::query("INSERT INTO refresh_tokens (token_id, user_id, created_at) VALUES (?, ?, ?)")
            .bind(replacement.token_id.as_str())
            .bind(replacement.user_id.to_string())
            .bind(replacement.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to record rotated refresh token", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit rotation", e))?;
        Ok(true)
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to reap refresh tokens", e))?;
        Ok(result.rows_affected() as usize)
    }
}
