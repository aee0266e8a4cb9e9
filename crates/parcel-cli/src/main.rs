//! Parcel CLI - follow shipments from the terminal
//!
//! Keeps a local cache of tracked parcels and prints a line whenever one of
//! them moves.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;
mod notifier;
#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::filter::Directive;

use crate::cli::{Cli, Commands};
use crate::commands::add::{run_add, run_archive};
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::resolve_db_path;
use crate::commands::config::run_config;
use crate::commands::list::{run_list, run_show};
use crate::commands::notifications::run_notifications;
use crate::commands::sync::{run_daemon, run_sync};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "parcel=info".parse::<Directive>() {
        env_filter = env_filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();
    let db_path =
        |explicit: Option<&str>| resolve_db_path(cli.db_path.clone(), explicit.or(profile));

    match cli.command {
        Commands::List {
            archived,
            limit,
            json,
        } => run_list(archived, limit, json, &db_path(None)?).await?,
        Commands::Show { id, json } => run_show(id, json, &db_path(None)?).await?,
        Commands::Add {
            tracking_number,
            title,
        } => run_add(&tracking_number, title.as_deref(), profile, &db_path(None)?).await?,
        Commands::Archive { id, undo } => {
            run_archive(id, undo, profile, &db_path(None)?).await?;
        }
        Commands::Sync => run_sync(profile, &db_path(None)?).await?,
        Commands::Daemon { interval_hours } => {
            run_daemon(interval_hours, profile, &db_path(None)?).await?;
        }
        Commands::Notifications { action } => {
            run_notifications(action, &db_path(None)?).await?;
        }
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Auth { command } => {
            let db_path = db_path(command.profile())?;
            run_auth(command, profile, &db_path).await?;
        }
    }

    Ok(())
}
