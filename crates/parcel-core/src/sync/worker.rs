//! One reconciliation cycle: fetch, diff, notify, persist.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use super::{reconcile, LocalStore, TrackingSource};
use crate::models::TrackingListSnapshot;
use crate::notify::Notifier;
use crate::rpc::{RpcError, RpcResult};
use crate::util::unix_timestamp_now;

const DEFAULT_FETCH_ATTEMPTS: u32 = 2;
const DEFAULT_RETRY_PAUSE: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to fetch trackings: {0}")]
    Fetch(#[from] RpcError),
    #[error("Failed to update local cache: {0}")]
    Store(#[from] crate::Error),
}

/// How often a failed list fetch is attempted before the cycle gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub pause: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, pause: Duration) -> Self {
        Self {
            max_attempts,
            pause,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_ATTEMPTS, DEFAULT_RETRY_PAUSE)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub new_records: usize,
    pub updated_records: usize,
    pub notified: usize,
    pub persisted: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} trackings cached ({} new, {} updated, {} notifications)",
            self.persisted, self.new_records, self.updated_records, self.notified
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Notifications are turned off; nothing was fetched or written
    Skipped,
    Completed(SyncReport),
}

pub struct SyncWorker<S, L, N> {
    source: S,
    store: L,
    notifier: N,
    retry: RetryPolicy,
}

impl<S, L, N> SyncWorker<S, L, N>
where
    S: TrackingSource,
    L: LocalStore,
    N: Notifier,
{
    pub fn new(source: S, store: L, notifier: N) -> Self {
        Self {
            source,
            store,
            notifier,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run one cycle.
    ///
    /// Nothing is written unless the fetch succeeds. Records are persisted in
    /// a single transaction, so a cycle that fails or is dropped part way
    /// leaves the previous snapshot cached.
    pub async fn run_cycle(&self) -> Result<SyncOutcome, SyncError> {
        if !self.store.load_notifications_enabled().await? {
            tracing::info!("Notifications are disabled; skipping sync");
            return Ok(SyncOutcome::Skipped);
        }

        let snapshot = self.fetch_with_retry().await?;
        let cached = self.store.load_all_records().await?;
        let reconciliation = reconcile(snapshot.trackings, &cached);

        for intent in &reconciliation.notifications {
            self.notifier.present(intent);
        }

        self.store.upsert_all(&reconciliation.records).await?;
        if let Some(user) = &snapshot.user {
            self.store.upsert_profile(user).await?;
        }
        self.store.mark_synced(unix_timestamp_now()).await?;

        let report = SyncReport {
            new_records: reconciliation.new_records,
            updated_records: reconciliation.updated_records,
            notified: reconciliation.notifications.len(),
            persisted: reconciliation.records.len(),
        };
        tracing::info!("Sync finished: {}", report);
        Ok(SyncOutcome::Completed(report))
    }

    async fn fetch_with_retry(&self) -> RpcResult<TrackingListSnapshot> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.source.fetch_tracking_list().await {
                Ok(snapshot) => return Ok(snapshot),
                // A rejected session will not fix itself between attempts
                Err(error) if error.is_unauthorized() || attempt >= max_attempts => {
                    return Err(error);
                }
                Err(error) => {
                    tracing::warn!(
                        "Fetching trackings failed (attempt {}/{}): {}",
                        attempt,
                        max_attempts,
                        error
                    );
                    tokio::time::sleep(self.retry.pause).await;
                    attempt += 1;
                }
            }
        }
    }
}
