//! Local cache for Parcel

mod connection;
mod migrations;
mod profile_repository;
mod settings_repository;
mod tracking_repository;

pub use connection::Database;
pub use profile_repository::{LibSqlProfileRepository, ProfileRepository};
pub use settings_repository::{LibSqlSettingsRepository, SettingsRepository};
pub use tracking_repository::{LibSqlTrackingRepository, TrackingRepository};
