//! HTTP client for the fit-sync document server.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::StatusCode;

use super::error::RemoteError;
use super::remote::RemoteStore;
use crate::models::AppState;

/// How long a reachability probe may take before the server counts as down.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Remote store backed by `GET`/`PUT /v1/accounts/{id}/state`.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    server_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpRemoteStore {
    pub fn new(server_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Builds from optional config values, failing if either is missing.
    pub fn from_parts(
        server_url: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<Self, RemoteError> {
        match (server_url, api_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                Ok(Self::new(url, key))
            }
            _ => Err(RemoteError::NotConfigured),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn state_url(&self, account_id: &str) -> String {
        build_http_url(
            &self.server_url,
            &format!("/v1/accounts/{}/state", urlencoding::encode(account_id)),
        )
    }

    async fn fetch_state(&self, account_id: &str) -> Result<Option<AppState>, RemoteError> {
        let response = self
            .client
            .get(self.state_url(account_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }

        Ok(Some(response.json::<AppState>().await?))
    }

    async fn push_state(&self, account_id: &str, state: &AppState) -> Result<(), RemoteError> {
        let response = self
            .client
            .put(self.state_url(account_id))
            .bearer_auth(&self.api_key)
            .json(state)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

impl RemoteStore for HttpRemoteStore {
    fn fetch<'a>(
        &'a self,
        account_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<AppState>, RemoteError>> {
        Box::pin(self.fetch_state(account_id))
    }

    fn push<'a>(
        &'a self,
        account_id: &'a str,
        state: &'a AppState,
    ) -> BoxFuture<'a, Result<(), RemoteError>> {
        Box::pin(self.push_state(account_id, state))
    }
}

/// Joins `path` onto a server URL, accepting `ws(s)://` and bare hosts.
pub fn build_http_url(server_url: &str, path: &str) -> String {
    let base_url = if let Some(rest) = server_url.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else if let Some(rest) = server_url.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
        format!("http://{}", server_url)
    } else {
        server_url.to_string()
    };

    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Returns true if the server answers `/health` within a few seconds.
pub async fn check_server(server_url: &str) -> bool {
    let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(client) => client,
        Err(_) => return false,
    };

    match client.get(build_http_url(server_url, "/health")).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}
