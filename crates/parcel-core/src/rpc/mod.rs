//! JSON-RPC client for the tracking backend.
//!
//! Every call is a JSON-RPC 2.0 POST to a single endpoint. The session token,
//! when present, travels as a bearer `Authorization` header.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{Profile, TrackingId, TrackingListSnapshot, TrackingRecord};
use crate::util::{compact_text, normalize_http_endpoint};

const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_LOGIN: &str = "auth.login";
pub const METHOD_LOGOUT: &str = "auth.logout";
pub const METHOD_LIST_TRACKINGS: &str = "trackings.list";
pub const METHOD_ADD_TRACKING: &str = "trackings.add";
pub const METHOD_ARCHIVE_TRACKING: &str = "trackings.archive";

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Invalid RPC configuration: {0}")]
    InvalidConfiguration(String),
    #[error("RPC request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("RPC endpoint returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Malformed RPC response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Not signed in")]
    NotSignedIn,
}

impl RpcError {
    /// Whether the backend rejected the session
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == StatusCode::UNAUTHORIZED.as_u16(),
            Self::NotSignedIn => true,
            _ => false,
        }
    }
}

pub type RpcResult<T> = Result<T, RpcError>;

/// Result of `auth.login`
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: Profile,
}

impl fmt::Debug for LoginResult {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LoginResult")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddTrackingParams<'a> {
    tracking_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ArchiveTrackingParams {
    id: TrackingId,
    archived: bool,
}

#[derive(Clone)]
pub struct RpcClient {
    endpoint: String,
    client: Client,
    token: Option<String>,
    next_id: Arc<AtomicU64>,
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RpcClient")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl RpcClient {
    pub fn new(endpoint: impl AsRef<str>) -> RpcResult<Self> {
        let endpoint = normalize_http_endpoint(endpoint.as_ref(), "RPC endpoint")
            .map_err(RpcError::InvalidConfiguration)?;
        Ok(Self {
            endpoint,
            client: Client::builder().build()?,
            token: None,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Attach a session token to every subsequent call
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform one JSON-RPC call and decode its `result`
    pub async fn call<P, R>(&self, method: &str, params: P) -> RpcResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .json(&request);
        if let Some(token) = self.token.as_deref() {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!(method, id = request.id, "Sending RPC request");
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RpcError::Status {
                status: status.as_u16(),
                message: parse_status_message(&body),
            });
        }

        decode_response(&body)
    }

    pub async fn login(&self, email: &str, password: &str) -> RpcResult<LoginResult> {
        self.call(
            METHOD_LOGIN,
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn logout(&self) -> RpcResult<()> {
        self.require_token()?;
        let _: Value = self.call(METHOD_LOGOUT, serde_json::json!({})).await?;
        Ok(())
    }

    pub async fn list_trackings(&self) -> RpcResult<TrackingListSnapshot> {
        self.require_token()?;
        self.call(METHOD_LIST_TRACKINGS, serde_json::json!({})).await
    }

    pub async fn add_tracking(
        &self,
        tracking_number: &str,
        title: Option<&str>,
    ) -> RpcResult<TrackingRecord> {
        self.require_token()?;
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(RpcError::InvalidConfiguration(
                "tracking number must not be empty".to_string(),
            ));
        }

        self.call(
            METHOD_ADD_TRACKING,
            AddTrackingParams {
                tracking_number,
                title: title.map(str::trim).filter(|title| !title.is_empty()),
            },
        )
        .await
    }

    pub async fn set_archived(&self, id: TrackingId, archived: bool) -> RpcResult<TrackingRecord> {
        self.require_token()?;
        self.call(METHOD_ARCHIVE_TRACKING, ArchiveTrackingParams { id, archived })
            .await
    }

    fn require_token(&self) -> RpcResult<()> {
        if self.token.is_some() {
            Ok(())
        } else {
            Err(RpcError::NotSignedIn)
        }
    }
}

/// Decode a JSON-RPC response body.
///
/// An `error` member wins over `result`; a missing `result` decodes as `null`.
pub fn decode_response<R: DeserializeOwned>(body: &str) -> RpcResult<R> {
    let envelope: RpcResponse = serde_json::from_str(body)?;
    if let Some(error) = envelope.error {
        return Err(RpcError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    Ok(serde_json::from_value(
        envelope.result.unwrap_or(Value::Null),
    )?)
}

fn parse_status_message(body: &str) -> String {
    if let Ok(RpcResponse {
        error: Some(error), ..
    }) = serde_json::from_str::<RpcResponse>(body)
    {
        if !error.message.trim().is_empty() {
            return error.message.trim().to_string();
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed
    }
}
