//! Data models for Parcel

mod notification;
mod profile;
mod settings;
mod tracking;

pub use notification::NotificationIntent;
pub use profile::{Profile, TrackingListSnapshot};
pub use settings::Settings;
pub use tracking::{parse_event_time, sort_checkpoints, Checkpoint, TrackingId, TrackingRecord};
