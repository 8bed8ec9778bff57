//! Catalog item and change classification types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A catalog item tracked across monitor passes.
///
/// Items are created on first observation and mutated in place afterwards;
/// the monitor never deletes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Stable external identifier, unique across all passes
    pub id: String,

    /// Display name (not guaranteed unique)
    pub name: String,

    /// Price in the smallest currency unit
    pub price_minor: i64,

    /// Current stock state
    pub in_stock: bool,

    /// Canonical detail-page URL
    pub url: String,

    /// Manually curated flag marking high-demand items for direct probing
    #[serde(default)]
    pub is_priority: bool,
}

/// Classification of a single observed change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    NewItem,
    Restock,
    SoldOut,
    PriceChange,
    Other,
}

impl ChangeKind {
    /// Short label used in alert titles.
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::NewItem => "New item",
            ChangeKind::Restock => "Back in stock",
            ChangeKind::SoldOut => "Sold out",
            ChangeKind::PriceChange => "Price change",
            ChangeKind::Other => "Catalog update",
        }
    }
}

/// A classified change, ready for notification dispatch.
///
/// Events keep observation order within a pass; there is no cross-pass
/// ordering guarantee.
#[derive(Debug, Clone)]
pub struct AlertEvent {
    /// Item snapshot after the change was applied
    pub item: Item,

    /// What changed
    pub kind: ChangeKind,

    /// Image URL from the observation, when the source provided one
    pub image_url: Option<String>,
}

/// Items mutated during a pass, keyed by id, destined for one bulk upsert.
///
/// An item appears at most once per pass; recording the same id again
/// replaces the earlier entry with the final state.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    items: HashMap<String, Item>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the final state of a mutated item.
    pub fn record(&mut self, item: Item) {
        self.items.insert(item.id.clone(), item);
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the changeset for persistence.
    pub fn into_items(self) -> Vec<Item> {
        self.items.into_values().collect()
    }
}
