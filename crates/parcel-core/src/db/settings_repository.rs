//! Settings repository implementation

use crate::error::Result;
use crate::models::Settings;
use libsql::Connection;

const NOTIFICATIONS_ENABLED_KEY: &str = "notifications_enabled";
const LAST_SYNCED_AT_KEY: &str = "last_synced_at";

/// Trait for settings storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    /// Load settings from the database
    async fn load(&self) -> Result<Settings>;
}

/// libSQL implementation of `SettingsRepository`
pub struct LibSqlSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Persist only the notifications toggle
    pub async fn set_notifications_enabled(&self, enabled: bool) -> Result<()> {
        self.set_setting(NOTIFICATIONS_ENABLED_KEY, bool_value(enabled))
            .await
    }

    /// Persist only the last sync time
    pub async fn set_last_synced_at(&self, synced_at: i64) -> Result<()> {
        self.set_setting(LAST_SYNCED_AT_KEY, &synced_at.to_string())
            .await
    }
}

impl SettingsRepository for LibSqlSettingsRepository<'_> {
    async fn load(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(value) = self.get_setting(NOTIFICATIONS_ENABLED_KEY).await? {
            settings.notifications_enabled = parse_bool(&value);
        }

        if let Some(value) = self.get_setting(LAST_SYNCED_AT_KEY).await? {
            settings.last_synced_at = value.trim().parse().ok();
        }

        Ok(settings)
    }
}

impl LibSqlSettingsRepository<'_> {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM settings WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row.get::<String>(0)?))
        } else {
            Ok(None)
        }
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }
}

const fn bool_value(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
