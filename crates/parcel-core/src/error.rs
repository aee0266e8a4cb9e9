//! Error types for parcel-core

use thiserror::Error;

/// Result type alias using parcel-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in parcel-core storage operations
#[derive(Error, Debug)]
pub enum Error {
    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
