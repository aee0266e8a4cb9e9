//! Session handling on top of the JSON-RPC auth methods.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Profile;
use crate::rpc::{LoginResult, RpcClient, RpcError};
use crate::util::unix_timestamp_now;

const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    /// Unix seconds; `None` when the backend issued a non-expiring token
    pub expires_at: Option<i64>,
    pub user: Profile,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS)
    }
}

impl From<LoginResult> for AuthSession {
    fn from(value: LoginResult) -> Self {
        Self {
            token: value.token,
            expires_at: value.expires_at,
            user: value.user,
        }
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Password is required")]
    MissingPassword,
    #[error("Auth request failed: {0}")]
    Rpc(#[from] RpcError),
    #[error("Failed to parse stored session: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

#[derive(Clone)]
pub struct RpcAuthClient<S: SessionPersistence> {
    rpc: RpcClient,
    store: S,
}

impl<S: SessionPersistence> RpcAuthClient<S> {
    pub const fn new(rpc: RpcClient, store: S) -> Self {
        Self { rpc, store }
    }

    /// The stored session, unless it has expired.
    ///
    /// Expired sessions are cleared; the backend offers no refresh call.
    pub fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored_session) = self.store.load_session()? else {
            return Ok(None);
        };

        if stored_session.is_expired() {
            tracing::info!("Stored session has expired; sign in again");
            self.store.clear_session()?;
            return Ok(None);
        }

        Ok(Some(stored_session))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;

        let session = AuthSession::from(self.rpc.login(email.trim(), password).await?);
        self.store.save_session(&session)?;
        tracing::info!(user_id = session.user.id, "Signed in");
        Ok(session)
    }

    /// Revoke the session remotely and forget it locally.
    ///
    /// A 401 from the backend means the token is already gone.
    pub async fn sign_out(&self, session: &AuthSession) -> AuthResult<()> {
        match self.authorized(session).logout().await {
            Ok(()) => {}
            Err(error) if error.is_unauthorized() => {
                tracing::debug!("Session was already revoked: {}", error);
            }
            Err(error) => return Err(error.into()),
        }

        self.store.clear_session()?;
        Ok(())
    }

    /// A client carrying the session token
    pub fn authorized(&self, session: &AuthSession) -> RpcClient {
        self.rpc.clone().with_token(session.token.clone())
    }
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::MissingEmail);
    }
    if password.trim().is_empty() {
        return Err(AuthError::MissingPassword);
    }
    Ok(())
}
