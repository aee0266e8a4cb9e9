use std::env;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use parcel_core::config::ClientConfig;
use parcel_core::rpc::RpcClient;
use parcel_core::services::DatabaseService;
use parcel_core::{Checkpoint, TrackingRecord};
use serde::Serialize;

use crate::auth::RpcAuthService;
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

const DB_PATH_ENV: &str = "PARCEL_DB_PATH";
const DB_FILE_NAME: &str = "parcel.db";

#[derive(Debug, Serialize)]
pub struct TrackingListItem {
    pub id: i64,
    pub tracking_number: String,
    pub title: String,
    pub carrier: Option<String>,
    pub archived: bool,
    pub delivered: bool,
    pub latest_status: Option<String>,
    pub latest_time: Option<String>,
    pub checkpoint_count: usize,
}

/// Profile name plus its resolved settings
pub struct ProfileContext {
    pub name: String,
    pub profile: Option<CliProfile>,
    pub client_config: ClientConfig,
}

impl ProfileContext {
    pub fn load(global_profile: Option<&str>) -> Result<Self, CliError> {
        let config = CliProfilesConfig::load().map_err(CliError::Config)?;
        let name = config.resolve_profile_name(global_profile);
        let profile = config.profile(&name).cloned();
        let client_config = profile
            .clone()
            .unwrap_or_default()
            .client_config()
            .map_err(CliError::Config)?;
        Ok(Self {
            name,
            profile,
            client_config,
        })
    }

    pub fn rpc_endpoint(&self) -> Result<String, CliError> {
        self.client_config.rpc_endpoint().map_err(CliError::Config)
    }

    pub fn auth_service(&self) -> Result<RpcAuthService, CliError> {
        RpcAuthService::new(&self.name, self.rpc_endpoint()?)
            .map_err(|error| CliError::Auth(error.to_string()))
    }

    /// An RPC client for the signed-in session of this profile
    pub fn authorized_client(&self) -> Result<RpcClient, CliError> {
        let service = self.auth_service()?;
        let session = service
            .restore_session()
            .map_err(|error| CliError::Auth(error.to_string()))?
            .ok_or_else(|| CliError::NotSignedIn(self.name.clone()))?;
        Ok(service.authorized_client(&session))
    }
}

/// `--db-path`, then `PARCEL_DB_PATH`, then the resolved profile's own cache.
pub fn resolve_db_path(
    cli_db_path: Option<PathBuf>,
    global_profile: Option<&str>,
) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os(DB_PATH_ENV).map(PathBuf::from)) {
        return Ok(path);
    }
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    Ok(default_db_path(&config.resolve_profile_name(global_profile)))
}

/// Tracking ids are only unique per backend, so every profile gets its own cache.
pub fn default_db_path(profile_name: &str) -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parcel")
        .join("profiles")
        .join(profile_dir_name(profile_name))
        .join(DB_FILE_NAME)
}

/// Directory name for a profile; bytes outside `[A-Za-z0-9_-]` are percent-encoded.
pub fn profile_dir_name(profile_name: &str) -> String {
    let mut dir_name = String::with_capacity(profile_name.len());
    for byte in profile_name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            dir_name.push(char::from(byte));
        } else {
            dir_name.push_str(&format!("%{byte:02X}"));
        }
    }
    dir_name
}

pub async fn open_database(path: &Path) -> Result<DatabaseService, CliError> {
    Ok(DatabaseService::open_path(path.to_path_buf()).await?)
}

pub fn record_to_list_item(record: &TrackingRecord) -> TrackingListItem {
    let latest = record.latest_checkpoint();
    TrackingListItem {
        id: record.id.get(),
        tracking_number: record.tracking_number.clone(),
        title: record.display_title(),
        carrier: record.carrier.clone(),
        archived: record.archived,
        delivered: record.is_delivered(),
        latest_status: latest.map(|checkpoint| checkpoint.status_text().to_string()),
        latest_time: latest.map(|checkpoint| checkpoint.time.clone()),
        checkpoint_count: record.checkpoints.len(),
    }
}

pub fn format_record_lines(records: &[TrackingRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let id = record.id.to_string();
            let title = truncate(&record.display_title(), 32);
            let status = record
                .latest_checkpoint()
                .map_or("no updates yet", Checkpoint::status_text);
            format!(
                "{id:>8}  {number:<24}  {title:<32}  {status}",
                number = record.tracking_number
            )
        })
        .collect()
}

pub fn format_record_details(record: &TrackingRecord) -> Vec<String> {
    let mut lines = vec![
        format!("{} [{}]", record.display_title(), record.id),
        format!("Tracking number: {}", record.tracking_number),
    ];
    if let Some(carrier) = record.carrier.as_deref() {
        lines.push(format!("Carrier: {carrier}"));
    }
    if record.archived {
        lines.push("Archived".to_string());
    }

    if record.checkpoints.is_empty() {
        lines.push("No checkpoints yet".to_string());
        return lines;
    }

    lines.push("Checkpoints:".to_string());
    for checkpoint in &record.checkpoints {
        let mut line = format!("  {:<19}  {}", checkpoint.time, checkpoint.status_text());
        if let Some(location) = checkpoint.location.as_deref() {
            line.push_str(&format!(" ({location})"));
        }
        lines.push(line);
    }
    lines
}

pub fn format_sync_timestamp(unix_seconds: i64) -> String {
    DateTime::from_timestamp(unix_seconds, 0).map_or_else(
        || unix_seconds.to_string(),
        |timestamp| timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated = chars.by_ref().take(max_chars).collect::<String>();
    if chars.next().is_some() {
        let kept = truncated
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        format!("{kept}...")
    } else {
        truncated
    }
}
