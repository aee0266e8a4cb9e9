//! CLI session helpers with secure keychain persistence.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use parcel_core::auth::{AuthResult, RpcAuthClient, SessionPersistence};
pub use parcel_core::auth::{AuthError, AuthSession};
use parcel_core::rpc::{RpcClient, RpcError, RpcResult};
use parcel_core::sync::TrackingSource;
use parcel_core::TrackingListSnapshot;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "parcel-cli";

#[derive(Clone)]
struct SessionStore {
    username: String,
}

impl SessionStore {
    fn new(profile_name: &str) -> Self {
        Self {
            username: format!("rpc_session:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl SessionPersistence for SessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let store = Self::test_store();
        let guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        if let Some(raw) = guard.get(&self.username) {
            Ok(Some(serde_json::from_str(raw)?))
        } else {
            Ok(None)
        }
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(())
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

#[derive(Clone)]
pub struct RpcAuthService {
    inner: RpcAuthClient<SessionStore>,
}

impl RpcAuthService {
    pub fn new(profile_name: &str, endpoint: impl AsRef<str>) -> AuthResult<Self> {
        Ok(Self {
            inner: RpcAuthClient::new(RpcClient::new(endpoint)?, SessionStore::new(profile_name)),
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.inner.sign_in(email, password).await
    }

    pub fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        self.inner.restore_session()
    }

    pub async fn sign_out(&self, session: &AuthSession) -> AuthResult<()> {
        self.inner.sign_out(session).await
    }

    /// RPC client carrying the session token
    pub fn authorized_client(&self, session: &AuthSession) -> RpcClient {
        self.inner.authorized(session)
    }
}

/// Tracking source that reads the profile's session before every fetch.
///
/// A long-running daemon picks up a fresh `parcel auth login` without a
/// restart, and an expired session fails the cycle with a sign-in hint.
pub struct SessionTrackingSource {
    profile_name: String,
    auth: RpcAuthService,
}

impl SessionTrackingSource {
    pub fn new(profile_name: impl Into<String>, auth: RpcAuthService) -> Self {
        Self {
            profile_name: profile_name.into(),
            auth,
        }
    }

    fn sign_in_hint(&self) {
        tracing::warn!(
            "Session for profile '{}' is missing or expired; run `parcel auth login --profile {}` to resume syncing",
            self.profile_name,
            self.profile_name
        );
    }
}

impl TrackingSource for SessionTrackingSource {
    async fn fetch_tracking_list(&self) -> RpcResult<TrackingListSnapshot> {
        let session = match self.auth.restore_session() {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.sign_in_hint();
                return Err(RpcError::NotSignedIn);
            }
            Err(error) => {
                tracing::warn!("Failed to read stored session: {}", error);
                return Err(RpcError::NotSignedIn);
            }
        };

        let result = self.auth.authorized_client(&session).list_trackings().await;
        if matches!(&result, Err(error) if error.is_unauthorized()) {
            self.sign_in_hint();
        }
        result
    }
}

pub fn load_stored_session(profile_name: &str) -> AuthResult<Option<AuthSession>> {
    SessionStore::new(profile_name).load_session()
}

pub fn clear_stored_session(profile_name: &str) -> AuthResult<()> {
    SessionStore::new(profile_name).clear_session()
}

#[cfg(test)]
pub(crate) fn store_test_session(profile_name: &str, session: &AuthSession) {
    SessionStore::new(profile_name)
        .save_session(session)
        .unwrap();
}

#[cfg(test)]
mod tests {
    use parcel_core::Profile;

    use super::*;

    fn session(expires_at: Option<i64>) -> AuthSession {
        AuthSession {
            token: "secret-session-token".to_string(),
            expires_at,
            user: Profile {
                id: 3,
                email: "ana@example.com".to_string(),
                name: None,
            },
        }
    }

    #[test]
    fn stored_sessions_are_scoped_per_profile() {
        store_test_session("auth-scope-a", &session(None));

        assert!(load_stored_session("auth-scope-a").unwrap().is_some());
        assert!(load_stored_session("auth-scope-b").unwrap().is_none());

        clear_stored_session("auth-scope-a").unwrap();
        assert!(load_stored_session("auth-scope-a").unwrap().is_none());
    }

    #[test]
    fn restore_session_drops_expired_sessions() {
        store_test_session("auth-expired", &session(Some(1)));

        let service = RpcAuthService::new("auth-expired", "https://api.example.com/rpc").unwrap();
        assert!(service.restore_session().unwrap().is_none());
        assert!(load_stored_session("auth-expired").unwrap().is_none());
    }

    #[tokio::test]
    async fn session_source_rereads_the_session_each_fetch() {
        let service = RpcAuthService::new("auth-source", "http://127.0.0.1:9/rpc").unwrap();
        let source = SessionTrackingSource::new("auth-source", service);

        assert!(matches!(
            source.fetch_tracking_list().await,
            Err(RpcError::NotSignedIn)
        ));

        store_test_session("auth-source", &session(Some(1)));
        assert!(matches!(
            source.fetch_tracking_list().await,
            Err(RpcError::NotSignedIn)
        ));
        assert!(load_stored_session("auth-source").unwrap().is_none());
    }

    #[test]
    fn new_rejects_invalid_endpoint() {
        assert!(matches!(
            RpcAuthService::new("auth-invalid", "api.example.com"),
            Err(AuthError::Rpc(_))
        ));
    }
}
