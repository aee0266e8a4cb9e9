//! User profile and list snapshot models

use serde::{Deserialize, Serialize};

use super::TrackingRecord;

/// The signed-in user as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Profile {
    /// Name if set, else the email address
    #[must_use]
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.email.as_str())
    }
}

/// Body of the tracking list call: the user plus every tracking they follow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingListSnapshot {
    #[serde(default)]
    pub user: Option<Profile>,
    #[serde(default)]
    pub trackings: Vec<TrackingRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_tolerates_missing_fields() {
        let snapshot: TrackingListSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.user.is_none());
        assert!(snapshot.trackings.is_empty());
    }

    #[test]
    fn test_profile_label_prefers_name() {
        let mut profile = Profile {
            id: 1,
            email: "ana@example.com".to_string(),
            name: None,
        };
        assert_eq!(profile.label(), "ana@example.com");

        profile.name = Some("Ana".to_string());
        assert_eq!(profile.label(), "Ana");
    }
}
