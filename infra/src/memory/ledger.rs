use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use cn_core::domain::entities::token::{LedgerEntry, TokenId};
use cn_core::errors::DomainError;
use cn_core::repositories::RefreshLedger;

/// Refresh ledger kept in a single map
///
/// Every mutation takes the write lock for its whole duration, so `rotate`
/// is a single atomic check-and-swap.
#[derive(Clone, Default)]
pub struct InMemoryRefreshLedger {
    rows: Arc<RwLock<HashMap<TokenId, LedgerEntry>>>,
}

impl InMemoryRefreshLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live rows
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Live rows for one user
    pub async fn count_for(&self, user_id: Uuid) -> usize {
        self.rows
            .read()
            .await
            .values()
            .filter(|row| row.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl RefreshLedger for InMemoryRefreshLedger {
    async fn record(&self, entry: LedgerEntry) -> Result<(), DomainError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&entry.token_id) {
            return Err(DomainError::internal(format!(
                "Refresh token id {} already recorded",
                entry.token_id
            )));
        }
        rows.insert(entry.token_id.clone(), entry);
        Ok(())
    }

    async fn is_live(&self, token_id: &TokenId, user_id: Uuid) -> Result<bool, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .get(token_id)
            .is_some_and(|row| row.user_id == user_id))
    }

    async fn revoke(&self, token_id: &TokenId) -> Result<bool, DomainError> {
        Ok(self.rows.write().await.remove(token_id).is_some())
    }

    async fn revoke_all_for(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, row| row.user_id != user_id);
        Ok(before - rows.len())
    }

    async fn rotate(
        &self,
        old: &TokenId,
        user_id: Uuid,
        replacement: LedgerEntry,
    ) -> Result<bool, DomainError> {
        let mut rows = self.rows.write().await;

        let owned = rows.get(old).is_some_and(|row| row.user_id == user_id);
        if !owned {
            return Ok(false);
        }
        if rows.contains_key(&replacement.token_id) {
            return Err(DomainError::internal(format!(
                "Refresh token id {} already recorded",
                replacement.token_id
            )));
        }

        rows.remove(old);
        rows.insert(replacement.token_id.clone(), replacement);
        Ok(true)
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, row| row.created_at >= cutoff);
        Ok(before - rows.len())
    }
}
