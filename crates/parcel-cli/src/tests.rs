use std::path::PathBuf;

use parcel_core::config::ClientConfig;
use parcel_core::services::DatabaseService;
use parcel_core::sync::{SyncOutcome, SyncReport};
use parcel_core::{Checkpoint, NotificationIntent, Profile, Settings, TrackingId, TrackingRecord};
use pretty_assertions::assert_eq;

use crate::auth::AuthSession;
use crate::cli::NotificationsAction;
use crate::commands::auth_cmd::{format_cached_profile, format_session_status};
use crate::commands::common::{
    format_record_details, format_record_lines, format_sync_timestamp, record_to_list_item,
    default_db_path, profile_dir_name, resolve_db_path, truncate,
};
use crate::commands::config::format_profile_summary;
use crate::commands::list::{run_list, run_show};
use crate::commands::notifications::{format_settings, run_notifications};
use crate::commands::sync::{format_sync_outcome, sync_job_name, sync_lock_dir};
use crate::error::CliError;
use crate::notifier::format_notification;

fn checkpoint(time: &str, status: &str, location: Option<&str>) -> Checkpoint {
    Checkpoint {
        time: time.to_string(),
        status_code: status.to_ascii_lowercase().replace(' ', "_"),
        status_name: status.to_string(),
        location: location.map(str::to_string),
        delivered: status == "Delivered",
        arrived: false,
    }
}

fn sample_record() -> TrackingRecord {
    TrackingRecord {
        title: Some("New headphones".to_string()),
        carrier: Some("InPost".to_string()),
        checkpoints: vec![
            checkpoint("2024-05-01 10:00:00", "In transit", Some("Warsaw")),
            checkpoint("2024-05-02 09:30:00", "Delivered", None),
        ],
        ..TrackingRecord::new(7, "LP000123456")
    }
}

#[test]
fn notification_line_includes_id_title_and_status() {
    let intent = NotificationIntent {
        record_id: TrackingId::new(7),
        title: "New headphones".to_string(),
        status_text: "Delivered".to_string(),
    };
    assert_eq!(format_notification(&intent), "[7] New headphones: Delivered");
}

#[test]
fn truncate_adds_ellipsis_only_when_needed() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly ten", 11), "exactly ten");
    assert_eq!(
        truncate("This is a very long sentence that should be shortened", 20),
        "This is a very lo..."
    );
}

#[test]
fn format_sync_timestamp_returns_utc_label() {
    assert_eq!(format_sync_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn record_lines_show_latest_status() {
    let empty = TrackingRecord::new(8, "LP999");
    let lines = format_record_lines(&[sample_record(), empty]);

    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("LP000123456"));
    assert!(lines[0].contains("New headphones"));
    assert!(lines[0].ends_with("Delivered"));
    assert!(lines[1].contains("LP999"));
    assert!(lines[1].ends_with("no updates yet"));
}

#[test]
fn record_details_list_checkpoints_with_locations() {
    let lines = format_record_details(&sample_record());

    assert_eq!(lines[0], "New headphones [7]");
    assert_eq!(lines[1], "Tracking number: LP000123456");
    assert_eq!(lines[2], "Carrier: InPost");
    assert!(lines.contains(&"  2024-05-01 10:00:00  In transit (Warsaw)".to_string()));
    assert!(lines.contains(&"  2024-05-02 09:30:00  Delivered".to_string()));
}

#[test]
fn record_details_without_checkpoints() {
    let lines = format_record_details(&TrackingRecord::new(1, "LP1"));
    assert_eq!(lines.last().map(String::as_str), Some("No checkpoints yet"));
}

#[test]
fn list_item_carries_latest_checkpoint() {
    let item = record_to_list_item(&sample_record());

    assert_eq!(item.id, 7);
    assert_eq!(item.latest_status.as_deref(), Some("Delivered"));
    assert_eq!(item.latest_time.as_deref(), Some("2024-05-02 09:30:00"));
    assert!(item.delivered);
    assert_eq!(item.checkpoint_count, 2);
}

#[test]
fn session_status_mentions_user_and_expiry() {
    assert_eq!(
        format_session_status("work", None),
        "Profile 'work' is not signed in."
    );

    let session = AuthSession {
        token: "token".to_string(),
        expires_at: Some(0),
        user: Profile {
            id: 1,
            email: "ana@example.com".to_string(),
            name: Some("Ana".to_string()),
        },
    };
    assert_eq!(
        format_session_status("work", Some(&session)),
        "Profile 'work' is signed in as Ana (expires 1970-01-01 00:00:00 UTC)"
    );
}

#[test]
fn cached_profile_line() {
    assert_eq!(
        format_cached_profile(None),
        "Cached account: none (run `parcel sync`)"
    );
    let profile = Profile {
        id: 1,
        email: "ana@example.com".to_string(),
        name: Some("Ana".to_string()),
    };
    assert_eq!(format_cached_profile(Some(&profile)), "Cached account: Ana");
}

#[test]
fn sync_outcome_messages() {
    assert!(format_sync_outcome(&SyncOutcome::Skipped).contains("notifications on"));
    assert_eq!(
        format_sync_outcome(&SyncOutcome::Completed(SyncReport {
            new_records: 1,
            updated_records: 0,
            notified: 1,
            persisted: 3,
        })),
        "Sync completed: 3 trackings cached (1 new, 0 updated, 1 notifications)"
    );
}

#[test]
fn sync_and_daemon_share_a_lock_per_profile() {
    assert_eq!(sync_job_name("work"), "tracking-sync:work");
    assert_ne!(sync_job_name("work"), sync_job_name("home"));
    assert_eq!(
        sync_lock_dir(&PathBuf::from("/var/cache/parcel/parcel.db")),
        PathBuf::from("/var/cache/parcel")
    );
    assert_eq!(sync_lock_dir(&PathBuf::from("parcel.db")), PathBuf::from("."));
}

#[test]
fn settings_summary_reports_paused_sync() {
    let lines = format_settings(&Settings {
        notifications_enabled: false,
        last_synced_at: None,
    });
    assert_eq!(
        lines,
        vec![
            "Notifications: off (background sync is paused)".to_string(),
            "Last synced: never".to_string(),
        ]
    );
}

#[test]
fn profile_summary_flags_missing_endpoint() {
    let lines = format_profile_summary("default", false, &ClientConfig::default());
    assert_eq!(
        lines,
        vec![
            "Profile: default (not saved)".to_string(),
            "Endpoint: (not configured)".to_string(),
            "Sync interval: 3h".to_string(),
        ]
    );
}

#[test]
fn resolve_db_path_prefers_explicit_flag() {
    let explicit = PathBuf::from("/tmp/parcel-explicit.db");
    assert_eq!(
        resolve_db_path(Some(explicit.clone()), Some("work")).unwrap(),
        explicit
    );
}

#[test]
fn profiles_get_separate_default_caches() {
    let work = default_db_path("work");
    let home = default_db_path("home");

    assert_ne!(work, home);
    assert_ne!(work.parent(), home.parent());
    assert!(work.ends_with("profiles/work/parcel.db"));
}

#[test]
fn profile_dir_names_cannot_escape_or_collide() {
    assert_eq!(profile_dir_name("work-2_eu"), "work-2_eu");
    assert_eq!(profile_dir_name("../etc"), "%2E%2E%2Fetc");
    assert_ne!(profile_dir_name("a/b"), profile_dir_name("a_b"));
    assert_ne!(profile_dir_name("a b"), profile_dir_name("a%20b"));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn run_show_reports_missing_tracking() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("parcel.db");

    let error = run_show(TrackingId::new(404), false, &db_path)
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::TrackingNotFound(id) if id.get() == 404));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn run_list_and_show_read_cached_records() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("parcel.db");

    {
        let db = DatabaseService::open_path(&db_path).await.unwrap();
        db.upsert_records(&[sample_record()]).await.unwrap();
    }

    run_list(false, 10, true, &db_path).await.unwrap();
    run_list(true, 10, false, &db_path).await.unwrap();
    run_show(TrackingId::new(7), true, &db_path).await.unwrap();
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn run_notifications_toggles_cached_setting() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("parcel.db");

    run_notifications(NotificationsAction::Off, &db_path)
        .await
        .unwrap();
    run_notifications(NotificationsAction::Status, &db_path)
        .await
        .unwrap();

    let db = DatabaseService::open_path(&db_path).await.unwrap();
    assert!(!db.load_settings().await.unwrap().notifications_enabled);
    drop(db);

    run_notifications(NotificationsAction::On, &db_path)
        .await
        .unwrap();
    let db = DatabaseService::open_path(&db_path).await.unwrap();
    assert!(db.load_settings().await.unwrap().notifications_enabled);
}
