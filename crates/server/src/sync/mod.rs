//! Multi-backend synchronization
//!
//! The broker decides which backend is authoritative on read and sequences a
//! write across the local file and the configured remotes. Failure isolation
//! is deliberately asymmetric: a content-host push failure reaches the caller
//! even though local persistence has already committed, while row-store
//! failures are logged and swallowed.

pub mod github;
pub mod supabase;

pub use github::GithubContentRemote;
pub use supabase::SupabaseRowRemote;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::store::LocalTaskStore;

/// Error from a remote replica operation.
#[derive(Debug, Error)]
pub enum ReplicaError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote rejected update: {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A remote copy of the task document.
///
/// `push` replicates the full document. `fetch` returns the remote copy for
/// replicas that support reads; write-only replicas keep the default.
#[async_trait]
pub trait Replica: Send + Sync {
    fn name(&self) -> &'static str;

    async fn push(&self, doc: &Value) -> std::result::Result<(), ReplicaError>;

    async fn fetch(&self) -> Option<Value> {
        None
    }
}

/// Orchestrates the local store and the configured remotes.
pub struct SyncBroker {
    local: LocalTaskStore,
    /// Push failures here propagate to the caller.
    content: Option<Arc<dyn Replica>>,
    /// Push and fetch failures here are isolated.
    rows: Option<Arc<dyn Replica>>,
}

impl SyncBroker {
    pub fn new(
        local: LocalTaskStore,
        content: Option<Arc<dyn Replica>>,
        rows: Option<Arc<dyn Replica>>,
    ) -> Self {
        Self {
            local,
            content,
            rows,
        }
    }

    pub fn local(&self) -> &LocalTaskStore {
        &self.local
    }

    /// Read the current document, remote-first.
    ///
    /// When the row store is configured and returns data, that copy is
    /// authoritative; otherwise the local file is served verbatim.
    pub async fn read(&self) -> Result<String> {
        if let Some(rows) = &self.rows {
            if let Some(doc) = rows.fetch().await {
                return Ok(serde_json::to_string(&doc)?);
            }
        }
        self.local.read().await
    }

    /// Accept a new document.
    ///
    /// Local persistence commits first, unconditionally. A content-host
    /// failure after that point aborts the remaining steps and is returned to
    /// the caller even though the local write stands. A row-store failure
    /// never surfaces.
    pub async fn write(&self, doc: &Value) -> Result<()> {
        self.local.write(doc).await?;

        if let Some(content) = &self.content {
            content
                .push(doc)
                .await
                .with_context(|| format!("{} replication failed", content.name()))?;
            info!("[Sync] pushed document to {}", content.name());
        }

        if let Some(rows) = &self.rows {
            match rows.push(doc).await {
                Ok(()) => info!("[Sync] pushed document to {}", rows.name()),
                Err(e) => warn!("[Sync] {} replication failed: {}", rows.name(), e),
            }
        }

        Ok(())
    }
}
