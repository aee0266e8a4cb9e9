use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use parcel_core::TrackingId;

#[derive(Parser)]
#[command(name = "parcel")]
#[command(about = "Track shipments and get notified when they move")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for endpoint and session configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List cached trackings
    #[command(alias = "ls")]
    List {
        /// Show archived trackings instead of active ones
        #[arg(long)]
        archived: bool,
        /// Number of trackings to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one cached tracking with its checkpoints
    Show {
        /// Tracking id
        id: TrackingId,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start tracking a shipment
    Add {
        /// Carrier tracking number
        tracking_number: String,
        /// Optional display title
        #[arg(long, short)]
        title: Option<String>,
    },
    /// Archive a tracking, or restore it with --undo
    Archive {
        /// Tracking id
        id: TrackingId,
        /// Move the tracking back to the active list
        #[arg(long)]
        undo: bool,
    },
    /// Fetch trackings once and notify about changes
    Sync,
    /// Keep syncing in the foreground until interrupted
    Daemon {
        /// Hours between sync cycles (defaults to the profile setting, then 3)
        #[arg(long, value_name = "HOURS")]
        interval_hours: Option<u64>,
    },
    /// Turn change notifications on or off
    Notifications {
        #[arg(value_enum)]
        action: NotificationsAction,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Sign in to the tracking service
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum NotificationsAction {
    On,
    Off,
    Status,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// JSON-RPC endpoint of the tracking service
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
        /// Hours between daemon sync cycles
        #[arg(long, value_name = "HOURS")]
        sync_interval_hours: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved profile configuration
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Login with email/password and store the session in the keychain
    Login {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show auth status for profile
    Status {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Logout profile and clear stored session
    Logout {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}

impl AuthCommands {
    /// Profile override given on the subcommand itself
    pub fn profile(&self) -> Option<&str> {
        match self {
            Self::Login { profile, .. } | Self::Status { profile } | Self::Logout { profile } => {
                profile.as_deref()
            }
        }
    }
}
