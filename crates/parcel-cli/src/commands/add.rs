use std::path::Path;

use parcel_core::models::sort_checkpoints;
use parcel_core::{TrackingId, TrackingRecord};

use crate::commands::common::{open_database, ProfileContext};
use crate::error::CliError;

pub async fn run_add(
    tracking_number: &str,
    title: Option<&str>,
    global_profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let tracking_number = tracking_number.trim();
    if tracking_number.is_empty() {
        return Err(CliError::EmptyTrackingNumber);
    }

    let client = ProfileContext::load(global_profile)?.authorized_client()?;
    let record = client.add_tracking(tracking_number, title).await?;
    cache_record(record.clone(), db_path).await?;

    println!("Added [{}] {}", record.id, record.display_title());
    Ok(())
}

pub async fn run_archive(
    id: TrackingId,
    undo: bool,
    global_profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let client = ProfileContext::load(global_profile)?.authorized_client()?;
    let record = client.set_archived(id, !undo).await?;
    cache_record(record.clone(), db_path).await?;

    let action = if record.archived { "Archived" } else { "Restored" };
    println!("{action} [{}] {}", record.id, record.display_title());
    Ok(())
}

/// Store a record returned by the service so it shows up before the next sync
async fn cache_record(mut record: TrackingRecord, db_path: &Path) -> Result<(), CliError> {
    sort_checkpoints(&mut record.checkpoints);
    let db = open_database(db_path).await?;
    db.upsert_records(std::slice::from_ref(&record)).await?;
    Ok(())
}
