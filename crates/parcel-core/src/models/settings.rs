//! Client settings model

use serde::{Deserialize, Serialize};

/// Locally cached client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// When false the background sync does not run at all
    pub notifications_enabled: bool,
    /// Completion time of the last successful sync (unix seconds)
    pub last_synced_at: Option<i64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            last_synced_at: None,
        }
    }
}
