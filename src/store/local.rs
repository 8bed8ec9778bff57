//! Local filesystem storage implementation.
//!
//! Keeps the whole collection in one JSON document for development and
//! small deployments.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── config.toml           # Monitor configuration
//! └── items.json            # Item snapshot with updated-at header
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Item;
use crate::store::{ItemStore, SnapshotData};

const SNAPSHOT_KEY: &str = "items.json";

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn load_snapshot(&self) -> Result<Vec<Item>> {
        match self.read_json::<SnapshotData>(SNAPSHOT_KEY).await? {
            Some(data) => Ok(data.items),
            None => {
                log::warn!("No items.json found, starting from an empty collection");
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl ItemStore for LocalStore {
    async fn find_all(&self) -> Result<Vec<Item>> {
        self.load_snapshot().await
    }

    async fn find_priority(&self) -> Result<Vec<Item>> {
        let items = self.load_snapshot().await?;
        Ok(items.into_iter().filter(|i| i.is_priority).collect())
    }

    async fn bulk_upsert(&self, items: &[Item]) -> Result<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        let existing = self.load_snapshot().await?;
        let mut by_id: HashMap<String, Item> = existing
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        for item in items {
            by_id.insert(item.id.clone(), item.clone());
        }

        let mut merged: Vec<Item> = by_id.into_values().collect();
        // Stable file ordering keeps diffs of items.json readable
        merged.sort_by(|a, b| a.id.cmp(&b.id));

        let count = items.len();
        self.write_json(SNAPSHOT_KEY, &SnapshotData::new(merged))
            .await?;
        log::info!("Upserted {count} items into {SNAPSHOT_KEY}");
        Ok(count)
    }
}
