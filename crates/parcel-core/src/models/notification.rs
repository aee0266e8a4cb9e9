//! Notification intent model

use std::fmt;

use super::{Checkpoint, TrackingId, TrackingRecord};

/// A status change worth telling the user about.
///
/// Produced and consumed within one sync cycle; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub record_id: TrackingId,
    pub title: String,
    pub status_text: String,
}

impl NotificationIntent {
    #[must_use]
    pub fn for_checkpoint(record: &TrackingRecord, checkpoint: &Checkpoint) -> Self {
        Self {
            record_id: record.id,
            title: record.display_title(),
            status_text: checkpoint.status_text().to_string(),
        }
    }
}

impl fmt::Display for NotificationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.status_text)
    }
}
