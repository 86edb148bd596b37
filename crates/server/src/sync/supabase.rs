//! Row-store replication (PostgREST)
//!
//! The document lives in a single row keyed by a fixed id. Reads collapse
//! every failure, including zero matching rows, into "no data"; the broker
//! then falls back to the local copy. Writes upsert with
//! merge-on-conflict-by-id semantics.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

use crate::config::SupabaseConfig;
use crate::sync::{Replica, ReplicaError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SupabaseRowRemote {
    client: reqwest::Client,
    config: SupabaseConfig,
}

impl SupabaseRowRemote {
    pub fn new(config: SupabaseConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.table)
    }

    fn select_url(&self) -> String {
        format!(
            "{}?id=eq.{}&select=data",
            self.table_url(),
            self.config.row_id
        )
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.config.service_key).header(
            "Authorization",
            format!("Bearer {}", self.config.service_key),
        )
    }

    async fn try_fetch(&self) -> std::result::Result<Option<Value>, ReplicaError> {
        let resp = self
            .authed(self.client.get(self.select_url()))
            .header("Accept", "application/json")
            .send()
            .await?
            .error_for_status()?;

        let mut rows: Vec<Value> = resp.json().await?;
        if rows.is_empty() {
            return Ok(None);
        }
        // A row whose data column is null is the same as no row
        match rows.remove(0).get("data") {
            None | Some(Value::Null) => Ok(None),
            Some(data) => Ok(Some(data.clone())),
        }
    }
}

#[async_trait]
impl Replica for SupabaseRowRemote {
    fn name(&self) -> &'static str {
        "supabase"
    }

    /// Every failure here is a cache miss, never an error.
    async fn fetch(&self) -> Option<Value> {
        match self.try_fetch().await {
            Ok(data) => data,
            Err(e) => {
                warn!("[Supabase] load failed: {}", e);
                None
            }
        }
    }

    async fn push(&self, doc: &Value) -> std::result::Result<(), ReplicaError> {
        let payload = json!({ "id": self.config.row_id, "data": doc });

        let resp = self
            .authed(self.client.post(self.table_url()))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
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
