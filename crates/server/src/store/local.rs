//! Local JSON file storage
//!
//! Writes go through a temp file and an atomic rename so a reader never
//! observes a partial document. The internal lock serializes read-modify-write
//! across concurrent requests: the last completed write wins cleanly.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

/// Durable store for the task document at a fixed path.
pub struct LocalTaskStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl LocalTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// Ensure the parent directory exists
    pub async fn ensure_dirs(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw persisted document bytes.
    ///
    /// The bytes are served verbatim; no parsing happens on the read path.
    pub async fn read(&self) -> Result<String> {
        let _guard = self.lock.read().await;
        fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))
    }

    /// Persist the document, fully replacing any prior content.
    pub async fn write(&self, doc: &Value) -> Result<()> {
        let json = serde_json::to_string_pretty(doc)?;
        let temp_path = self.path.with_extension("tmp");

        let _guard = self.lock.write().await;
        fs::write(&temp_path, json)
            .await
            .with_context(|| format!("failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}
