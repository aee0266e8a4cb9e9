//! Client configuration shared by the CLI profiles and the sync daemon.
//!
//! A `ClientConfig` holds the values a profile stores on disk. Environment
//! overrides are layered on top before the values are validated.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sync::DEFAULT_SYNC_INTERVAL;
use crate::util::{normalize_http_endpoint, normalize_text_option};

pub const ENV_RPC_URL: &str = "PARCEL_RPC_URL";
pub const ENV_SYNC_INTERVAL_HOURS: &str = "PARCEL_SYNC_INTERVAL_HOURS";

const SECONDS_PER_HOUR: u64 = 3_600;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub rpc_endpoint: Option<String>,
    #[serde(default)]
    pub sync_interval_hours: Option<u64>,
}

impl ClientConfig {
    /// Apply `PARCEL_RPC_URL` and `PARCEL_SYNC_INTERVAL_HOURS` when set.
    pub fn with_env_overrides(self) -> Result<Self, String> {
        self.with_overrides(
            std::env::var(ENV_RPC_URL).ok(),
            std::env::var(ENV_SYNC_INTERVAL_HOURS).ok(),
        )
    }

    /// Apply raw override values; blank values are ignored.
    pub fn with_overrides(
        mut self,
        rpc_url: Option<String>,
        interval_hours: Option<String>,
    ) -> Result<Self, String> {
        if let Some(rpc_url) = normalize_text_option(rpc_url) {
            self.rpc_endpoint = Some(rpc_url);
        }
        if let Some(raw_hours) = normalize_text_option(interval_hours) {
            self.sync_interval_hours = Some(parse_interval_hours(&raw_hours)?);
        }
        Ok(self)
    }

    /// The validated RPC endpoint.
    pub fn rpc_endpoint(&self) -> Result<String, String> {
        let Some(endpoint) = self.rpc_endpoint.as_deref() else {
            return Err(format!(
                "RPC endpoint is not configured; run `parcel config init --endpoint <url>` or set {ENV_RPC_URL}"
            ));
        };
        normalize_http_endpoint(endpoint, "RPC endpoint")
    }

    /// The daemon interval, falling back to three hours.
    pub fn sync_interval(&self) -> Result<Duration, String> {
        self.sync_interval_hours
            .map_or(Ok(DEFAULT_SYNC_INTERVAL), interval_from_hours)
    }
}

/// Parse a positive whole number of hours.
pub fn parse_interval_hours(raw: &str) -> Result<u64, String> {
    let hours = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("sync interval must be a whole number of hours, got '{raw}'"))?;
    interval_from_hours(hours)?;
    Ok(hours)
}

/// Interval for a whole number of hours, rejecting zero and overflow.
pub fn interval_from_hours(hours: u64) -> Result<Duration, String> {
    if hours == 0 {
        return Err("sync interval must be at least one hour".to_string());
    }
    hours
        .checked_mul(SECONDS_PER_HOUR)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("sync interval of {hours} hours is too large"))
}
