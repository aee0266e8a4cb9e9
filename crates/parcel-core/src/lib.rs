//! parcel-core - Core library for Parcel
//!
//! This crate contains the shared models, local cache, JSON-RPC client and the
//! background sync routine used by the Parcel command-line client.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod rpc;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{
    Checkpoint, NotificationIntent, Profile, Settings, TrackingId, TrackingListSnapshot,
    TrackingRecord,
};
