//! GitHub Gist publisher.
//!
//! All generated files go out in one `PATCH /gists/{id}` so the Gist never
//! shows a half-updated set. No retries: a failed upload is reported and the
//! next scheduled run tries again.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::config::GistConfig;
use crate::error::{Result, SyncError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Generated files keyed by filename. Ordered so request bodies are stable.
pub type FileSet = BTreeMap<String, String>;

#[derive(Debug, Serialize)]
struct GistFile<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct GistUpdate<'a> {
    files: BTreeMap<&'a str, GistFile<'a>>,
}

impl<'a> GistUpdate<'a> {
    fn new(files: &'a FileSet) -> Self {
        Self {
            files: files
                .iter()
                .map(|(name, content)| (name.as_str(), GistFile { content: content.as_str() }))
                .collect(),
        }
    }
}

pub struct GistPublisher {
    http: reqwest::Client,
    api_base: String,
    gist_id: String,
    token: String,
}

impl GistPublisher {
    /// Publisher for `config`. A missing token or Gist id is a configuration
    /// error; the caller skips the upload and keeps the local files.
    pub fn new(config: &GistConfig, api_base: &str) -> Result<Self> {
        let (gist_id, token) = match (&config.id, &config.token) {
            (Some(id), Some(token)) => (id.clone(), token.clone()),
            _ => {
                return Err(SyncError::Config(
                    "GITHUB_TOKEN or GIST_ID missing".to_string(),
                ))
            }
        };
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SyncError::Publish(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            gist_id,
            token,
        })
    }

    /// PATCH /gists/{id}: replace or add every file in `files`.
    pub async fn publish(&self, files: &FileSet) -> Result<()> {
        let url = format!("{}/gists/{}", self.api_base, self.gist_id);
        tracing::info!(files = files.len(), "uploading to gist {}", self.gist_id);

        let resp = self
            .http
            .patch(&url)
            .bearer_auth(&self.token)
            .header("Accept", ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .json(&GistUpdate::new(files))
            .send()
            .await
            .map_err(|e| SyncError::Publish(format!("request to {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Publish(format!("status={status}, body={body}")));
        }

        tracing::info!("gist {} updated", self.gist_id);
        Ok(())
    }
}
