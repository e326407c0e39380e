use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::token::{LedgerEntry, TokenId};
use crate::repositories::{MockRefreshLedger, RefreshLedger};
use crate::services::token::{LedgerReaper, LedgerReaperConfig};

#[tokio::test]
async fn test_reaper_deletes_only_stale_rows() {
    let ledger = Arc::new(MockRefreshLedger::new());
    let user_id = Uuid::new_v4();

    let mut stale = LedgerEntry::new(TokenId::generate(), user_id);
    stale.created_at = Utc::now() - Duration::days(31);
    let fresh = LedgerEntry::new(TokenId::generate(), user_id);
    let fresh_id = fresh.token_id.clone();

    ledger.insert_raw(stale).await;
    ledger.insert_raw(fresh).await;

    let reaper = LedgerReaper::new(ledger.clone(), LedgerReaperConfig::default());
    let result = reaper.run_once().await.unwrap();

    assert_eq!(result.rows_deleted, 1);
    assert_eq!(ledger.len().await, 1);
    assert!(ledger.is_live(&fresh_id, user_id).await.unwrap());
}

#[tokio::test]
async fn test_disabled_reaper_does_not_spawn() {
    let ledger = Arc::new(MockRefreshLedger::new());
    let reaper = Arc::new(LedgerReaper::new(
        ledger,
        LedgerReaperConfig {
            enabled: false,
            ..Default::default()
        },
    ));

    assert!(reaper.start_background_task().is_none());
}
