//! Storage abstractions for item persistence.
//!
//! The store is a document collection keyed by the stable item id. It
//! supports "find all", "find priority", and an idempotent bulk upsert with
//! last-writer-wins set semantics.

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Item;

// Re-export for convenience
pub use local::LocalStore;

/// Header for the item snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotData {
    /// ISO 8601 timestamp of last update
    pub updated_at: DateTime<Utc>,
    /// Total item count
    pub count: usize,
    /// The items array
    pub items: Vec<Item>,
}

impl SnapshotData {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: items.len(),
            items,
        }
    }
}

/// Trait for item storage backends.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Load every known item.
    async fn find_all(&self) -> Result<Vec<Item>>;

    /// Load items flagged for priority probing.
    async fn find_priority(&self) -> Result<Vec<Item>>;

    /// Upsert items by id: create-if-absent, replace-if-present.
    ///
    /// Returns the number of items written. Applying the same batch twice
    /// leaves the store unchanged.
    async fn bulk_upsert(&self, items: &[Item]) -> Result<usize>;
}
