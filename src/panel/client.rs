//! 3x-ui panel API client.
//!
//! Logs in with form credentials and keeps the session cookie in the
//! client's cookie store for the follow-up list request.

use std::time::Duration;

use serde::Deserialize;

use super::inbound::Inbound;
use crate::config::PanelConfig;
use crate::error::{Result, SyncError};

/// Request timeout for panel calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect timeout for panel calls.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const LOGIN_PATH: &str = "/login";
const INBOUNDS_LIST_PATH: &str = "/panel/api/inbounds/list";

/// Envelope shared by every panel response.
#[derive(Debug, Deserialize)]
struct PanelResponse<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    msg: Option<String>,
    obj: Option<T>,
}

impl<T> PanelResponse<T> {
    fn message(&self) -> &str {
        self.msg
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("no message")
    }
}

/// An authenticated panel session.
pub struct PanelSession {
    http: reqwest::Client,
    base_url: String,
}

impl PanelSession {
    /// Log in to the panel at `url`.
    ///
    /// The panel answers 200 even for bad credentials, so the `success` flag
    /// in the body decides the outcome.
    pub async fn authenticate(url: &str, username: &str, password: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Auth(format!("failed to build panel HTTP client: {e}")))?;
        let base_url = url.trim_end_matches('/').to_string();
        let login_url = format!("{base_url}{LOGIN_PATH}");

        let resp = http
            .post(&login_url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| SyncError::Auth(describe_transport_error(&login_url, &e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Auth(format!("panel returned HTTP {status}")));
        }

        let body: PanelResponse<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| SyncError::Auth(format!("unexpected login response: {e}")))?;
        if !body.success {
            return Err(SyncError::Auth(body.message().to_string()));
        }

        tracing::info!("logged in to panel {base_url}");
        Ok(Self { http, base_url })
    }

    /// Convenience wrapper over [`PanelSession::authenticate`].
    pub async fn login(config: &PanelConfig) -> Result<Self> {
        Self::authenticate(&config.url, &config.username, &config.password).await
    }

    /// Fetch the inbound list and pick the one with `id`.
    pub async fn fetch_inbound(&self, id: i64) -> Result<Inbound> {
        let inbounds = self.list_inbounds().await?;
        find_inbound(inbounds, id)
    }

    async fn list_inbounds(&self) -> Result<Vec<Inbound>> {
        let url = format!("{}{INBOUNDS_LIST_PATH}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SyncError::Api(describe_transport_error(&url, &e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Api(format!(
                "inbound list returned HTTP {status}: {body}"
            )));
        }

        let body: PanelResponse<Vec<Inbound>> = resp
            .json()
            .await
            .map_err(|e| SyncError::Api(format!("invalid inbound list response: {e}")))?;
        if !body.success {
            return Err(SyncError::Api(body.message().to_string()));
        }
        Ok(body.obj.unwrap_or_default())
    }
}

fn find_inbound(inbounds: Vec<Inbound>, id: i64) -> Result<Inbound> {
    inbounds
        .into_iter()
        .find(|inbound| inbound.id == id)
        .ok_or(SyncError::NotFound { id })
}

fn describe_transport_error(url: &str, e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {url}")
    } else if e.is_connect() {
        format!("failed to connect to {url}: {e}")
    } else {
        format!("request failed: {url}: {e}")
    }
}
