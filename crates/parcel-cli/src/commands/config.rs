use parcel_core::config::{interval_from_hours, ClientConfig};
use parcel_core::util::normalize_http_endpoint;

use crate::cli::ConfigCommands;
use crate::commands::common::ProfileContext;
use crate::config_profiles::{default_config_path, normalize_text_option, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            endpoint,
            sync_interval_hours,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            endpoint,
            sync_interval_hours,
            no_activate,
        ),
        ConfigCommands::Show => run_config_show(global_profile),
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn run_config_init(
    profile_name: Option<&str>,
    endpoint: Option<String>,
    sync_interval_hours: Option<u64>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing_profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged_endpoint = normalize_text_option(endpoint)
        .or_else(|| existing_profile.rpc_endpoint())
        .ok_or_else(|| {
            CliError::Config(format!(
                "Profile '{profile_name}' has no endpoint; pass --endpoint <URL>"
            ))
        })?;
    let merged_endpoint =
        normalize_http_endpoint(&merged_endpoint, "endpoint").map_err(CliError::Config)?;

    let merged_interval = match sync_interval_hours {
        Some(hours) => {
            interval_from_hours(hours).map_err(CliError::Config)?;
            Some(hours)
        }
        None => existing_profile.sync_interval_hours,
    };

    let profile = config.profile_mut_or_default(&profile_name);
    profile.rpc_endpoint = Some(merged_endpoint);
    profile.sync_interval_hours = merged_interval;

    if !no_activate || config.active_profile.is_none() {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!("Saved profile '{profile_name}' to {}", path.display());
    if config.active_profile.as_deref() == Some(profile_name.as_str()) {
        println!("Active profile: {profile_name}");
    }
    Ok(())
}

pub fn run_config_show(global_profile: Option<&str>) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let summary = format_profile_summary(
        &context.name,
        context.profile.is_some(),
        &context.client_config,
    );
    for line in summary {
        println!("{line}");
    }
    println!("Config file: {}", default_config_path().display());
    Ok(())
}

pub fn format_profile_summary(
    profile_name: &str,
    is_saved: bool,
    client_config: &ClientConfig,
) -> Vec<String> {
    let saved_label = if is_saved { "" } else { " (not saved)" };
    let endpoint = client_config
        .rpc_endpoint()
        .unwrap_or_else(|_| "(not configured)".to_string());
    let interval = client_config.sync_interval().map_or_else(
        |error| format!("invalid ({error})"),
        |interval| format!("{}h", interval.as_secs() / 3_600),
    );

    vec![
        format!("Profile: {profile_name}{saved_label}"),
        format!("Endpoint: {endpoint}"),
        format!("Sync interval: {interval}"),
    ]
}
