//! Tracking record and checkpoint models

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const EVENT_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Backend identifier of a tracking record, stable across syncs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(i64);

impl TrackingId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TrackingId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// One timestamped status event of a shipment.
///
/// Equality covers every field; two checkpoints that differ only in
/// `status_name` are different events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Event time as reported by the carrier
    pub time: String,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub status_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub delivered: bool,
    #[serde(default)]
    pub arrived: bool,
}

impl Checkpoint {
    /// Parsed event time, `None` when the carrier sent something unreadable
    #[must_use]
    pub fn event_time(&self) -> Option<NaiveDateTime> {
        parse_event_time(&self.time)
    }

    /// Human readable status, falling back to the raw status code
    #[must_use]
    pub fn status_text(&self) -> &str {
        let name = self.status_name.trim();
        if name.is_empty() {
            self.status_code.trim()
        } else {
            name
        }
    }
}

/// A shipment followed by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRecord {
    pub id: TrackingId,
    #[serde(default)]
    pub tracking_number: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
}

impl TrackingRecord {
    /// Create an empty, active record
    #[must_use]
    pub fn new(id: i64, tracking_number: impl Into<String>) -> Self {
        Self {
            id: TrackingId::new(id),
            tracking_number: tracking_number.into(),
            title: None,
            carrier: None,
            archived: false,
            checkpoints: Vec::new(),
        }
    }

    /// Title shown to the user: the custom title, else the tracking number
    #[must_use]
    pub fn display_title(&self) -> String {
        if let Some(title) = self.title.as_deref().map(str::trim) {
            if !title.is_empty() {
                return title.to_string();
            }
        }

        let number = self.tracking_number.trim();
        if number.is_empty() {
            format!("#{}", self.id)
        } else {
            number.to_string()
        }
    }

    /// The checkpoint describing the current status.
    ///
    /// Picks the greatest event time; unreadable times rank lowest and ties go
    /// to the later position, so for an ascending sequence this is the last
    /// element.
    #[must_use]
    pub fn latest_checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoints
            .iter()
            .enumerate()
            .max_by_key(|(position, checkpoint)| (checkpoint.event_time(), *position))
            .map(|(_, checkpoint)| checkpoint)
    }

    /// Whether the latest checkpoint reports delivery
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.latest_checkpoint()
            .is_some_and(|checkpoint| checkpoint.delivered)
    }
}

/// Parse a carrier event time.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, the same with a `T` separator, and RFC 3339
/// (converted to UTC). Returns `None` for anything else.
#[must_use]
pub fn parse_event_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in EVENT_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|parsed| parsed.naive_utc())
}

/// Sort checkpoints by event time ascending.
///
/// Stable; entries with unreadable times move to the front in their original
/// relative order.
pub fn sort_checkpoints(checkpoints: &mut [Checkpoint]) {
    checkpoints.sort_by_key(Checkpoint::event_time);
}
