//! Mock implementation of RefreshLedger for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::token::{LedgerEntry, TokenId};
use crate::errors::DomainError;

use super::r#trait::RefreshLedger;

/// Mock ledger for testing
#[derive(Clone, Default)]
pub struct MockRefreshLedger {
    rows: Arc<RwLock<HashMap<TokenId, LedgerEntry>>>,
    fail_revokes: Arc<AtomicBool>,
}

impl MockRefreshLedger {
    /// Create a new mock ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Make `revoke` report a storage failure until switched back
    pub fn set_fail_revokes(&self, fail: bool) {
        self.fail_revokes.store(fail, Ordering::SeqCst);
    }

    /// Insert a row directly, bypassing duplicate checks
    pub async fn insert_raw(&self, entry: LedgerEntry) {
        self.rows.write().await.insert(entry.token_id.clone(), entry);
    }
}

#[async_trait]
impl RefreshLedger for MockRefreshLedger {
    async fn record(&self, entry: LedgerEntry) -> Result<(), DomainError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&entry.token_id) {
            return Err(DomainError::internal("duplicate ledger row"));
        }
        rows.insert(entry.token_id.clone(), entry);
        Ok(())
    }

    async fn is_live(&self, token_id: &TokenId, user_id: Uuid) -> Result<bool, DomainError> {
        let rows = self.rows.read().await;
        Ok(rows.get(token_id).map_or(false, |row| row.user_id == user_id))
    }

    async fn revoke(&self, token_id: &TokenId) -> Result<bool, DomainError> {
        if self.fail_revokes.load(Ordering::SeqCst) {
            return Err(DomainError::internal("ledger unavailable"));
        }
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
        if !rows.get(old).is_some_and(|row| row.user_id == user_id) {
            return Ok(false);
        }
        if rows.contains_key(&replacement.token_id) {
            return Err(DomainError::internal("duplicate ledger row"));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rotate_refuses_existing_replacement() {
        let ledger = MockRefreshLedger::new();
        let user_id = Uuid::new_v4();
        let old = LedgerEntry::new(TokenId::generate(), user_id);
        let taken = LedgerEntry::new(TokenId::generate(), user_id);
        ledger.record(old.clone()).await.unwrap();
        ledger.record(taken.clone()).await.unwrap();

        let result = ledger.rotate(&old.token_id, user_id, taken.clone()).await;
        assert!(matches!(result, Err(DomainError::Internal { .. })));
        assert!(ledger.is_live(&old.token_id, user_id).await.unwrap());
        assert_eq!(ledger.len().await, 2);
    }
}
