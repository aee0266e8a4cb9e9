use std::path::{Path, PathBuf};

use parcel_core::config::interval_from_hours;
use parcel_core::sync::{JobLock, SyncOutcome, SyncScheduler, SyncWorker};

use crate::auth::SessionTrackingSource;
use crate::commands::common::{open_database, ProfileContext};
use crate::error::CliError;
use crate::notifier::TerminalNotifier;

pub async fn run_sync(global_profile: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let client = context.authorized_client()?;
    let _lock = JobLock::acquire(&sync_lock_dir(db_path), &sync_job_name(&context.name))?;
    let db = open_database(db_path).await?;

    let worker = SyncWorker::new(client, db, TerminalNotifier::default());
    println!("{}", format_sync_outcome(&worker.run_cycle().await?));
    Ok(())
}

pub async fn run_daemon(
    interval_hours: Option<u64>,
    global_profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let interval = match interval_hours {
        Some(hours) => interval_from_hours(hours),
        None => context.client_config.sync_interval(),
    }
    .map_err(CliError::Config)?;
    // Fail fast when not signed in; later cycles re-read the session
    context.authorized_client()?;
    let source = SessionTrackingSource::new(context.name.clone(), context.auth_service()?);
    let db = open_database(db_path).await?;

    let worker = SyncWorker::new(source, db, TerminalNotifier::default());
    let scheduler = SyncScheduler::new(worker, interval)
        .with_job_name(sync_job_name(&context.name))
        .with_lock_dir(sync_lock_dir(db_path));

    println!(
        "Syncing profile '{}' every {}h. Press Ctrl-C to stop.",
        context.name,
        interval.as_secs() / 3_600
    );

    scheduler
        .run_until(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", error);
                std::future::pending::<()>().await;
            }
        })
        .await;

    println!("Stopped");
    Ok(())
}

/// Job name shared by `sync` and `daemon` for one profile
pub fn sync_job_name(profile_name: &str) -> String {
    format!("tracking-sync:{profile_name}")
}

/// Lock files live next to the cache they guard
pub fn sync_lock_dir(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

pub fn format_sync_outcome(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Skipped => {
            "Notifications are off; sync skipped. Run `parcel notifications on` to resume."
                .to_string()
        }
        SyncOutcome::Completed(report) => format!("Sync completed: {report}"),
    }
}
