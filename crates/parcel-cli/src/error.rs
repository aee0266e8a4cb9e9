use parcel_core::rpc::RpcError;
use parcel_core::sync::{LockError, SyncError};
use parcel_core::TrackingId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] parcel_core::Error),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Tracking number cannot be empty")]
    EmptyTrackingNumber,
    #[error("Tracking not found in local cache: {0}. Run `parcel sync` to refresh it.")]
    TrackingNotFound(TrackingId),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Profile '{0}' is not signed in. Run `parcel auth login --email <EMAIL> --password <PASSWORD>` first.")]
    NotSignedIn(String),
}
