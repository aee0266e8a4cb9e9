//! Background reconciliation of the remote tracking list into the local cache.
//!
//! One cycle fetches the remote snapshot, diffs it against the cache, presents
//! a notification per new or changed shipment, then persists the snapshot.

mod lock;
mod reconcile;
mod scheduler;
mod worker;

pub use lock::{lock_path, JobLock, LockError};
pub use reconcile::{reconcile, Reconciliation};
pub use scheduler::{SyncScheduler, DEFAULT_SYNC_INTERVAL};
pub use worker::{RetryPolicy, SyncError, SyncOutcome, SyncReport, SyncWorker};

use crate::models::{Profile, TrackingListSnapshot, TrackingRecord};
use crate::rpc::{RpcClient, RpcResult};
use crate::Result;

/// Where remote snapshots come from
#[allow(async_fn_in_trait)]
pub trait TrackingSource {
    async fn fetch_tracking_list(&self) -> RpcResult<TrackingListSnapshot>;
}

impl TrackingSource for RpcClient {
    async fn fetch_tracking_list(&self) -> RpcResult<TrackingListSnapshot> {
        self.list_trackings().await
    }
}

/// The local cache as seen by the sync worker
#[allow(async_fn_in_trait)]
pub trait LocalStore {
    async fn load_notifications_enabled(&self) -> Result<bool>;

    async fn load_all_records(&self) -> Result<Vec<TrackingRecord>>;

    /// Insert or replace the given records; records not given are kept
    async fn upsert_all(&self, records: &[TrackingRecord]) -> Result<()>;

    async fn upsert_profile(&self, profile: &Profile) -> Result<()>;

    async fn mark_synced(&self, synced_at: i64) -> Result<()>;
}
