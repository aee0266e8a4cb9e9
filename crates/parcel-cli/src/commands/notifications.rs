use std::path::Path;

use parcel_core::Settings;

use crate::cli::NotificationsAction;
use crate::commands::common::{format_sync_timestamp, open_database};
use crate::error::CliError;

pub async fn run_notifications(action: NotificationsAction, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;

    match action {
        NotificationsAction::On | NotificationsAction::Off => {
            let enabled = action == NotificationsAction::On;
            db.set_notifications_enabled(enabled).await?;
            tracing::debug!(enabled, "Updated notifications setting");
            println!(
                "Notifications {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        NotificationsAction::Status => {
            for line in format_settings(&db.load_settings().await?) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

pub fn format_settings(settings: &Settings) -> Vec<String> {
    let state = if settings.notifications_enabled {
        "on"
    } else {
        "off (background sync is paused)"
    };
    let last_synced = settings
        .last_synced_at
        .map_or_else(|| "never".to_string(), format_sync_timestamp);
    vec![
        format!("Notifications: {state}"),
        format!("Last synced: {last_synced}"),
    ]
}
