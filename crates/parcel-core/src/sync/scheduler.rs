//! Periodic driver for the sync worker.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::lock::{JobLock, LockError};
use super::{LocalStore, SyncOutcome, SyncWorker, TrackingSource};
use crate::notify::Notifier;

pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(3 * 60 * 60);

const DEFAULT_JOB_NAME: &str = "tracking-sync";

/// Runs a `SyncWorker` immediately and then once per interval.
///
/// Cycles run one at a time on the calling task. A cycle that outlasts the
/// interval delays the next tick instead of queueing extra cycles. Cycle
/// errors are logged and the next tick tries again.
///
/// With a lock directory, each cycle also holds the job's lock file, so other
/// processes running the same job name skip instead of overlapping.
pub struct SyncScheduler<S, L, N> {
    worker: SyncWorker<S, L, N>,
    interval: Duration,
    job_name: String,
    lock_dir: Option<PathBuf>,
}

impl<S, L, N> SyncScheduler<S, L, N>
where
    S: TrackingSource,
    L: LocalStore,
    N: Notifier,
{
    pub fn new(worker: SyncWorker<S, L, N>, interval: Duration) -> Self {
        Self {
            worker,
            // tokio rejects a zero period
            interval: interval.max(Duration::from_secs(1)),
            job_name: DEFAULT_JOB_NAME.to_string(),
            lock_dir: None,
        }
    }

    #[must_use]
    pub fn with_job_name(mut self, job_name: impl Into<String>) -> Self {
        self.job_name = job_name.into();
        self
    }

    #[must_use]
    pub fn with_lock_dir(mut self, lock_dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(lock_dir.into());
        self
    }

    pub fn lock_dir(&self) -> Option<&Path> {
        self.lock_dir.as_deref()
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Run cycles until `shutdown` resolves.
    ///
    /// Shutdown is only observed between cycles.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            job = %self.job_name,
            interval_secs = self.interval.as_secs(),
            "Sync scheduler started"
        );

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!(job = %self.job_name, "Sync scheduler stopping");
                    break;
                }
                _ = ticker.tick() => self.run_once().await,
            }
        }
    }

    /// Run one cycle, logging instead of returning the outcome.
    pub async fn run_once(&self) {
        tracing::debug!(job = %self.job_name, "Sync tick");
        let lock = self
            .lock_dir
            .as_deref()
            .map(|dir| JobLock::acquire(dir, &self.job_name))
            .transpose();
        let _lock = match lock {
            Ok(lock) => lock,
            Err(error @ LockError::Held { .. }) => {
                tracing::info!(job = %self.job_name, "Sync skipped: {}", error);
                return;
            }
            Err(error) => {
                tracing::warn!(job = %self.job_name, "Sync skipped: {}", error);
                return;
            }
        };

        match self.worker.run_cycle().await {
            Ok(SyncOutcome::Skipped) => {
                tracing::debug!(job = %self.job_name, "Sync skipped");
            }
            Ok(SyncOutcome::Completed(report)) => {
                tracing::debug!(job = %self.job_name, "Sync completed: {}", report);
            }
            Err(error) => {
                tracing::warn!(job = %self.job_name, "Sync failed: {}", error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TrackingListSnapshot, TrackingRecord};
    use crate::rpc::RpcError;
    use crate::sync::worker::tests::{FakeSource, FakeStore, RecordingNotifier, NO_PAUSE};

    #[test]
    fn default_interval_is_three_hours() {
        assert_eq!(DEFAULT_SYNC_INTERVAL, Duration::from_secs(10_800));
    }

    #[tokio::test]
    async fn first_cycle_runs_immediately() {
        let source = FakeSource::with(vec![Ok(TrackingListSnapshot {
            user: None,
            trackings: vec![TrackingRecord::new(1, "LP1")],
        })]);
        let store = FakeStore::default();
        let worker = SyncWorker::new(source.clone(), store.clone(), RecordingNotifier::default());
        let scheduler = SyncScheduler::new(worker, DEFAULT_SYNC_INTERVAL).with_job_name("test-sync");

        scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(200)))
            .await;

        assert_eq!(scheduler.job_name(), "test-sync");
        assert_eq!(source.calls(), 1);
        assert_eq!(store.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_cycles_are_swallowed() {
        let source = FakeSource::with(vec![
            Err(RpcError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            }),
            Err(RpcError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            }),
        ]);
        let store = FakeStore::default();
        let worker = SyncWorker::new(source.clone(), store.clone(), RecordingNotifier::default())
            .with_retry_policy(NO_PAUSE);
        let scheduler = SyncScheduler::new(worker, DEFAULT_SYNC_INTERVAL);

        scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(200)))
            .await;

        assert_eq!(source.calls(), 2);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn cycle_is_skipped_while_another_process_holds_the_job() {
        let tmp = tempfile::tempdir().unwrap();
        let source = FakeSource::default();
        let worker = SyncWorker::new(
            source.clone(),
            FakeStore::default(),
            RecordingNotifier::default(),
        );
        let scheduler = SyncScheduler::new(worker, DEFAULT_SYNC_INTERVAL)
            .with_job_name("tracking-sync:work")
            .with_lock_dir(tmp.path());

        let held = JobLock::acquire(tmp.path(), "tracking-sync:work").unwrap();
        scheduler.run_once().await;
        assert_eq!(source.calls(), 0);

        drop(held);
        scheduler.run_once().await;
        assert_eq!(source.calls(), 1);
        assert!(!crate::sync::lock::lock_path(tmp.path(), "tracking-sync:work").exists());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let worker = SyncWorker::new(
            FakeSource::default(),
            FakeStore::default(),
            RecordingNotifier::default(),
        );
        let scheduler = SyncScheduler::new(worker, Duration::ZERO);
        assert_eq!(scheduler.interval(), Duration::from_secs(1));
        assert_eq!(scheduler.job_name(), "tracking-sync");
        assert!(scheduler.lock_dir().is_none());
    }
}
