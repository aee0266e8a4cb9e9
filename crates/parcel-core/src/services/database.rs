//! Shared database service wrapper used by the CLI and the sync worker.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    Database, LibSqlProfileRepository, LibSqlSettingsRepository, LibSqlTrackingRepository,
    ProfileRepository, SettingsRepository, TrackingRepository,
};
use crate::models::{Profile, Settings, TrackingId, TrackingRecord};
use crate::sync::LocalStore;
use crate::Result;

/// Thread-safe service for DB and repository operations.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open the cache at the given filesystem path.
    ///
    /// A file that is not a database is moved aside and a fresh cache is
    /// created; everything in it can be fetched again.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = match Database::open(&db_path).await {
            Ok(db) => db,
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local cache at {} is unreadable: {}. Starting from an empty cache.",
                    db_path.display(),
                    error
                );
                Self::quarantine_corrupted_db_files(&db_path)?;
                Database::open(&db_path).await?
            }
            Err(error) => return Err(error),
        };

        tracing::debug!("Opened local cache at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Path of the backing file, `None` for in-memory services.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn is_corrupted_db_error(error: &crate::Error) -> bool {
        error
            .to_string()
            .to_ascii_lowercase()
            .contains("file is not a database")
    }

    fn quarantine_corrupted_db_files(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let base_name = db_path
                .file_name()
                .map_or_else(|| "parcel.db".into(), |name| name.to_string_lossy());
            let backup_path = db_path.with_file_name(format!("{base_name}.corrupt-{timestamp}"));

            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(
                "Moved corrupted local DB file from {} to {}",
                db_path.display(),
                backup_path.display()
            );
        }

        let Some(parent) = db_path.parent() else {
            return Ok(());
        };
        let Some(base_name) = db_path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };
        // WAL and shared-memory sidecars
        let sidecar_prefix = format!("{base_name}-");

        for entry in std::fs::read_dir(parent)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with(&sidecar_prefix) {
                let path = entry.path();
                std::fs::remove_file(&path)?;
                tracing::warn!("Removed stale local DB file {}", path.display());
            }
        }

        Ok(())
    }

    /// Every cached record, ordered by id.
    pub async fn load_all_records(&self) -> Result<Vec<TrackingRecord>> {
        let db = self.db.lock().await;
        let repo = LibSqlTrackingRepository::new(db.connection());
        repo.list_all().await
    }

    /// Cached records with the given archived flag, most recently synced first.
    pub async fn list_records(&self, archived: bool, limit: usize) -> Result<Vec<TrackingRecord>> {
        let db = self.db.lock().await;
        let repo = LibSqlTrackingRepository::new(db.connection());
        repo.list(archived, limit).await
    }

    /// Fetch a cached record by id.
    pub async fn get_record(&self, id: TrackingId) -> Result<Option<TrackingRecord>> {
        let db = self.db.lock().await;
        let repo = LibSqlTrackingRepository::new(db.connection());
        repo.get(id).await
    }

    /// Insert or replace records in one transaction.
    pub async fn upsert_records(&self, records: &[TrackingRecord]) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlTrackingRepository::new(db.connection());
        repo.upsert_all(records).await
    }

    /// The cached user profile.
    pub async fn load_profile(&self) -> Result<Option<Profile>> {
        let db = self.db.lock().await;
        let repo = LibSqlProfileRepository::new(db.connection());
        repo.load().await
    }

    pub async fn save_profile(&self, profile: &Profile) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlProfileRepository::new(db.connection());
        repo.upsert(profile).await
    }

    /// Forget the cached user profile, e.g. after signing out.
    pub async fn clear_profile(&self) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlProfileRepository::new(db.connection());
        repo.clear().await
    }

    /// Load settings.
    pub async fn load_settings(&self) -> Result<Settings> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.load().await
    }

    pub async fn set_notifications_enabled(&self, enabled: bool) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.set_notifications_enabled(enabled).await
    }
}

impl LocalStore for DatabaseService {
    async fn load_notifications_enabled(&self) -> Result<bool> {
        Ok(self.load_settings().await?.notifications_enabled)
    }

    async fn load_all_records(&self) -> Result<Vec<TrackingRecord>> {
        Self::load_all_records(self).await
    }

    async fn upsert_all(&self, records: &[TrackingRecord]) -> Result<()> {
        self.upsert_records(records).await
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        self.save_profile(profile).await
    }

    async fn mark_synced(&self, synced_at: i64) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.set_last_synced_at(synced_at).await
    }
}
