//! Content-host replication (GitHub contents API)
//!
//! Write-only. Every push re-reads the current revision token and submits a
//! conditional update against a fixed branch. A missing or unreadable token
//! means "no prior revision" and the update proceeds unconditionally, which
//! is what lets the first push create the file. A token mismatch is rejected
//! by the remote and surfaces as a push failure.

use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::GithubConfig;
use crate::sync::{Replica, ReplicaError};

const USER_AGENT: &str = concat!("taskboard-server/", env!("CARGO_PKG_VERSION"));
/// The contents API has no inherent bound; a stalled push must not stall the
/// write request forever.
const PUSH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GithubContentRemote {
    client: reqwest::Client,
    config: GithubConfig,
}

/// Contents API update payload. `sha` carries the optimistic-concurrency
/// token and is omitted on first-time creation.
#[derive(Serialize)]
struct ContentUpdate {
    message: String,
    content: String,
    branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

impl GithubContentRemote {
    pub fn new(config: GithubConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(PUSH_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    fn contents_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/contents/{}",
            self.config.owner, self.config.repo, self.config.path
        )
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("Authorization", format!("token {}", self.config.token))
            .header("Accept", "application/vnd.github+json")
    }

    /// Current revision token for the tracked path, or `None` when the file
    /// does not exist yet or the lookup fails for any reason.
    async fn current_revision(&self) -> Option<String> {
        let resp = self
            .authed(self.client.get(self.contents_url()))
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            debug!("[Github] no revision token ({})", resp.status());
            return None;
        }
        let info: Value = resp.json().await.ok()?;
        info.get("sha").and_then(Value::as_str).map(str::to_string)
    }

    fn update_payload(
        &self,
        doc: &Value,
        sha: Option<String>,
    ) -> std::result::Result<ContentUpdate, ReplicaError> {
        let pretty = serde_json::to_string_pretty(doc)?;
        Ok(ContentUpdate {
            message: "Update tasks via taskboard server".to_string(),
            content: base64::engine::general_purpose::STANDARD.encode(pretty),
            branch: self.config.branch.clone(),
            sha,
        })
    }
}

#[async_trait]
impl Replica for GithubContentRemote {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn push(&self, doc: &Value) -> std::result::Result<(), ReplicaError> {
        let sha = self.current_revision().await;
        let payload = self.update_payload(doc, sha)?;

        let resp = self
            .authed(self.client.put(self.contents_url()))
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReplicaError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
