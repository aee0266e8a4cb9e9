use std::path::Path;

use parcel_core::TrackingId;

use crate::commands::common::{
    format_record_details, format_record_lines, open_database, record_to_list_item,
    TrackingListItem,
};
use crate::error::CliError;

pub async fn run_list(
    archived: bool,
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let records = db.list_records(archived, limit).await?;

    if as_json {
        let json_items = records
            .iter()
            .map(record_to_list_item)
            .collect::<Vec<TrackingListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if records.is_empty() {
        if archived {
            println!("No archived trackings.");
        } else {
            println!("No trackings cached. Run `parcel sync` to fetch them.");
        }
        return Ok(());
    }

    for line in format_record_lines(&records) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_show(id: TrackingId, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let record = db
        .get_record(id)
        .await?
        .ok_or(CliError::TrackingNotFound(id))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        for line in format_record_details(&record) {
            println!("{line}");
        }
    }
    Ok(())
}
