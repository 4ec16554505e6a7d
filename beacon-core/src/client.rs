//! HTTP client for the beacon relay
//!
//! Used by the device agent to push updates and by the terminal
//! dashboard to obtain the session cookie before opening `/ws`.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::auth::cookie_value;
use crate::protocol::{UpdateRequest, UpdateResponse};
use crate::SESSION_COOKIE;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Authentication failed")]
    AuthFailed,

    #[error("Server did not set a session cookie")]
    MissingSessionCookie,

    #[error("Unexpected status: {0}")]
    UnexpectedStatus(StatusCode),
}

/// Default bound on a single request, connect included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Relay API client
pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    /// Create new relay client
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// Create a relay client whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client: {}, using defaults", e);
                Client::new()
            });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Push one device report
    pub async fn push_update(&self, request: &UpdateRequest) -> Result<UpdateResponse, ClientError> {
        let resp = self
            .client
            .post(format!("{}/update", self.base_url))
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ClientError::UnexpectedStatus(resp.status()));
        }

        Ok(resp.json().await?)
    }

    /// Pass the credential challenge on `/` and return the session token
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let resp = self
            .client
            .get(format!("{}/", self.base_url))
            .basic_auth(username, Some(password))
            .send()
            .await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED => return Err(ClientError::AuthFailed),
            status if !status.is_success() => return Err(ClientError::UnexpectedStatus(status)),
            _ => {}
        }

        resp.headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| cookie_value(value, SESSION_COOKIE))
            .map(String::from)
            .ok_or(ClientError::MissingSessionCookie)
    }

    /// WebSocket URL of the live channel
    pub fn live_url(&self) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!("{}/ws", base)
    }
}
