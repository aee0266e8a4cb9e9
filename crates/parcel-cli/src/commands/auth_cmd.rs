use std::path::Path;

use parcel_core::Profile;

use crate::auth::{clear_stored_session, load_stored_session, AuthSession};
use crate::cli::AuthCommands;
use crate::commands::common::{format_sync_timestamp, open_database, ProfileContext};
use crate::error::CliError;

pub async fn run_auth(
    command: AuthCommands,
    global_profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    match command {
        AuthCommands::Login {
            profile,
            email,
            password,
        } => {
            let context = ProfileContext::load(profile.as_deref().or(global_profile))?;
            let service = context.auth_service()?;
            let session = service
                .sign_in(&email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;

            let db = open_database(db_path).await?;
            db.save_profile(&session.user).await?;

            println!(
                "Signed in profile '{}' as {}",
                context.name,
                session.user.label()
            );
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let context = ProfileContext::load(profile.as_deref().or(global_profile))?;
            let session = if context.client_config.rpc_endpoint.is_some() {
                context
                    .auth_service()?
                    .restore_session()
                    .map_err(|error| CliError::Auth(error.to_string()))?
            } else {
                load_stored_session(&context.name)
                    .map_err(|error| CliError::Auth(error.to_string()))?
            };

            println!("{}", format_session_status(&context.name, session.as_ref()));

            let db = open_database(db_path).await?;
            println!("{}", format_cached_profile(db.load_profile().await?.as_ref()));
            Ok(())
        }
        AuthCommands::Logout { profile } => {
            let context = ProfileContext::load(profile.as_deref().or(global_profile))?;
            let stored_session = load_stored_session(&context.name)
                .map_err(|error| CliError::Auth(error.to_string()))?;

            match (context.rpc_endpoint().ok(), stored_session) {
                (Some(_), Some(session)) => {
                    context
                        .auth_service()?
                        .sign_out(&session)
                        .await
                        .map_err(|error| CliError::Auth(error.to_string()))?;
                }
                _ => {
                    clear_stored_session(&context.name)
                        .map_err(|error| CliError::Auth(error.to_string()))?;
                }
            }

            let db = open_database(db_path).await?;
            db.clear_profile().await?;

            println!("Signed out profile '{}'", context.name);
            Ok(())
        }
    }
}

pub fn format_session_status(profile_name: &str, session: Option<&AuthSession>) -> String {
    let Some(session) = session else {
        return format!("Profile '{profile_name}' is not signed in.");
    };

    let expiry = session.expires_at.map_or_else(
        || "no expiry".to_string(),
        |expires_at| format!("expires {}", format_sync_timestamp(expires_at)),
    );
    format!(
        "Profile '{}' is signed in as {} ({})",
        profile_name,
        session.user.label(),
        expiry
    )
}

/// The account the local cache was last synced for
pub fn format_cached_profile(profile: Option<&Profile>) -> String {
    profile.map_or_else(
        || "Cached account: none (run `parcel sync`)".to_string(),
        |profile| format!("Cached account: {}", profile.label()),
    )
}
