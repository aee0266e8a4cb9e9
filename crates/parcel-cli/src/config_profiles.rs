//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parcel_core::config::ClientConfig;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";
const PROFILE_ENV: &str = "PARCEL_PROFILE";
const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(default)]
    pub rpc_endpoint: Option<String>,
    #[serde(default)]
    pub sync_interval_hours: Option<u64>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parcel")
        .join(CONFIG_FILE_NAME)
}

pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    parcel_core::util::normalize_text_option(value)
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path();
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Explicit flag, then `PARCEL_PROFILE`, then the active profile.
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        self.resolve_profile_name_with_env(explicit, std::env::var(PROFILE_ENV).ok().as_deref())
    }

    pub fn resolve_profile_name_with_env(
        &self,
        explicit: Option<&str>,
        env_profile: Option<&str>,
    ) -> String {
        normalize_profile_name(explicit)
            .or_else(|| normalize_profile_name(env_profile))
            .or_else(|| normalize_profile_name(self.active_profile.as_deref()))
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    pub fn rpc_endpoint(&self) -> Option<String> {
        normalize_text_option(self.rpc_endpoint.clone())
    }

    /// Stored values with `PARCEL_RPC_URL` / `PARCEL_SYNC_INTERVAL_HOURS` applied.
    pub fn client_config(&self) -> Result<ClientConfig, String> {
        ClientConfig {
            rpc_endpoint: self.rpc_endpoint(),
            sync_interval_hours: self.sync_interval_hours,
        }
        .with_env_overrides()
    }

    fn normalize(&mut self) {
        self.rpc_endpoint = normalize_text_option(self.rpc_endpoint.clone())
            .map(|endpoint| endpoint.trim_end_matches('/').to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_profile_name_rejects_empty() {
        assert_eq!(normalize_profile_name(None), None);
        assert_eq!(normalize_profile_name(Some(" ")), None);
        assert_eq!(normalize_profile_name(Some(" work ")), Some("work".to_string()));
    }

    #[test]
    fn config_roundtrip_preserves_profiles() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = CliProfilesConfig {
            version: 1,
            active_profile: Some(" default ".to_string()),
            profiles: BTreeMap::new(),
        };
        config.profiles.insert(
            "default".to_string(),
            CliProfile {
                rpc_endpoint: Some(" https://api.example.com/rpc/ ".to_string()),
                sync_interval_hours: Some(6),
            },
        );

        config.save_to_path(&path).unwrap();
        let loaded = CliProfilesConfig::load_from_path(&path).unwrap();
        let profile = loaded.profile("default").unwrap();
        assert_eq!(loaded.active_profile.as_deref(), Some("default"));
        assert_eq!(
            profile.rpc_endpoint.as_deref(),
            Some("https://api.example.com/rpc")
        );
        assert_eq!(profile.sync_interval_hours, Some(6));
    }

    #[test]
    fn missing_config_file_loads_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let loaded = CliProfilesConfig::load_from_path(&tmp.path().join("absent.json")).unwrap();
        assert_eq!(loaded, CliProfilesConfig::default());
    }

    #[test]
    fn invalid_config_file_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let error = CliProfilesConfig::load_from_path(&path).unwrap_err();
        assert!(error.contains("Failed to parse config"));
        assert!(error.contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn resolve_profile_name_prefers_explicit_then_env_then_active() {
        let config = CliProfilesConfig {
            version: 1,
            active_profile: Some("work".to_string()),
            profiles: BTreeMap::new(),
        };
        assert_eq!(
            config.resolve_profile_name_with_env(Some("mobile"), Some("env")),
            "mobile"
        );
        assert_eq!(config.resolve_profile_name_with_env(None, Some("env")), "env");
        assert_eq!(config.resolve_profile_name_with_env(None, Some(" ")), "work");
        assert_eq!(
            CliProfilesConfig::default().resolve_profile_name_with_env(None, None),
            "default"
        );
    }
}
