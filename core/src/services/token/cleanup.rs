//! Background reaper for stale refresh ledger rows
//!
//! A ledger row outlives its token when the holder simply stops using it.
//! Such rows can never be redeemed, since the token itself has expired,
//! but they accumulate; the reaper deletes rows older than the refresh
//! token lifetime.

use chrono::{DateTime, Duration, Utc};
use cn_shared::AuthConfig;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::RefreshLedger;

/// Configuration for the ledger reaper
#[derive(Debug, Clone)]
pub struct LedgerReaperConfig {
    /// How often to sweep (in seconds)
    pub interval_seconds: u64,
    /// Rows older than this are deleted
    pub max_age: Duration,
    /// Whether to run the background task at all
    pub enabled: bool,
}

impl Default for LedgerReaperConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600,
            max_age: Duration::days(30),
            enabled: true,
        }
    }
}

impl From<&AuthConfig> for LedgerReaperConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            interval_seconds: config.ledger_cleanup.interval_seconds,
            max_age: Duration::seconds(config.jwt.refresh_token_ttl),
            enabled: config.ledger_cleanup.enabled,
        }
    }
}

/// Periodically deletes ledger rows whose tokens can no longer verify
pub struct LedgerReaper<L: RefreshLedger + 'static> {
    ledger: Arc<L>,
    config: LedgerReaperConfig,
}

impl<L: RefreshLedger> LedgerReaper<L> {
    pub fn new(ledger: Arc<L>, config: LedgerReaperConfig) -> Self {
        Self { ledger, config }
    }

    /// Run a single sweep relative to the current time
    pub async fn run_once(&self) -> Result<ReapResult, DomainError> {
        self.run_at(Utc::now()).await
    }

    /// Run a single sweep as of `now`
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<ReapResult, DomainError> {
        let cutoff = now - self.config.max_age;
        let rows_deleted = self.ledger.delete_created_before(cutoff).await?;

        if rows_deleted > 0 {
            info!(rows_deleted, %cutoff, "Reaped stale refresh ledger rows");
        }
        Ok(ReapResult { rows_deleted, cutoff })
    }

    /// Start the reaper as a background task
    ///
    /// Returns `None` when the reaper is disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Ledger reaper is disabled");
            return None;
        }

        let period = std::time::Duration::from_secs(self.config.interval_seconds.max(1));

        Some(tokio::spawn(async move {
            info!(
                interval_seconds = self.config.interval_seconds,
                "Ledger reaper started"
            );

            let mut timer = tokio::time::interval(period);
            loop {
                timer.tick().await;
                if let Err(e) = self.run_once().await {
                    error!("Ledger reap cycle failed: {}", e);
                }
            }
        }))
    }
}

/// Result of one sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapResult {
    /// Number of rows deleted
    pub rows_deleted: usize,
    /// Rows created before this instant were eligible
    pub cutoff: DateTime<Utc>,
}
