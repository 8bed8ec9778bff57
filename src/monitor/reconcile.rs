//! Change detection between observed listings and known item state.
//!
//! The reconciler is the sole owner of change classification: every
//! observation flows through here, and the resulting changeset holds each
//! mutated item exactly once with its final state for the pass.

use std::collections::HashMap;

use crate::models::{AlertEvent, ChangeKind, Changeset, Item, Observation};

/// Accumulated result of one reconciliation pass.
#[derive(Debug, Default)]
pub struct PassOutcome {
    /// Items mutated during the pass, keyed by id
    pub changeset: Changeset,
    /// Classified alert events in observation order
    pub events: Vec<AlertEvent>,
}

impl PassOutcome {
    pub fn has_changes(&self) -> bool {
        !self.changeset.is_empty()
    }
}

/// Diffs a batch of fresh observations against the known-state map.
pub struct Reconciler {
    known: HashMap<String, Item>,
    changeset: Changeset,
    events: Vec<AlertEvent>,
}

impl Reconciler {
    /// Create a reconciler over a known-state map.
    pub fn new(known: HashMap<String, Item>) -> Self {
        Self {
            known,
            changeset: Changeset::new(),
            events: Vec::new(),
        }
    }

    /// Build the known-state map from a loaded item list.
    pub fn from_items(items: Vec<Item>) -> Self {
        Self::new(
            items
                .into_iter()
                .map(|item| (item.id.clone(), item))
                .collect(),
        )
    }

    /// Reconcile one listing observation.
    ///
    /// `url` is the canonical detail-page URL computed by the caller; for
    /// secret listings it is the search-page fallback. Observations missing
    /// id, name, price, or URL are skipped on the new-item path only;
    /// existing items are never dropped for missing optional fields.
    pub fn observe_listing(&mut self, obs: &Observation, url: Option<&str>) {
        let Some(id) = obs.id.as_deref() else {
            log::debug!("Skipping listing entry without id ({:?})", obs.title);
            return;
        };

        match self.known.get(id) {
            None => self.admit_new(id, obs, url),
            Some(existing) => {
                let existing = existing.clone();
                self.update_existing(existing, obs, url);
            }
        }
    }

    /// Reconcile a direct stock probe of a known item.
    ///
    /// Unchanged stock produces no alert and no changeset entry.
    pub fn observe_stock(&mut self, id: &str, in_stock: bool, image_url: Option<&str>) {
        let Some(existing) = self.known.get(id) else {
            log::debug!("Probe for unknown item {id} ignored");
            return;
        };

        if existing.in_stock == in_stock {
            return;
        }

        let mut item = existing.clone();
        item.in_stock = in_stock;
        let kind = if in_stock {
            ChangeKind::Restock
        } else {
            ChangeKind::SoldOut
        };
        self.commit(item, Some(kind), image_url);
    }

    /// Consume the reconciler, returning the updated known map and the
    /// accumulated outcome.
    pub fn into_parts(self) -> (HashMap<String, Item>, PassOutcome) {
        (
            self.known,
            PassOutcome {
                changeset: self.changeset,
                events: self.events,
            },
        )
    }

    /// Consume the reconciler, keeping only the outcome.
    pub fn into_outcome(self) -> PassOutcome {
        self.into_parts().1
    }

    fn admit_new(&mut self, id: &str, obs: &Observation, url: Option<&str>) {
        let (Some(name), Some(price_minor), Some(url)) =
            (obs.title.as_deref(), obs.price_minor, url)
        else {
            // Promotional placeholders and other non-product entries
            log::debug!("Skipping non-product listing entry {id}");
            return;
        };

        let item = Item {
            id: id.to_string(),
            name: name.to_string(),
            price_minor,
            in_stock: obs.is_in_stock(),
            url: url.to_string(),
            is_priority: false,
        };
        self.commit(item, Some(ChangeKind::NewItem), obs.image_url.as_deref());
    }

    fn update_existing(&mut self, existing: Item, obs: &Observation, url: Option<&str>) {
        let mut item = existing;
        let mut dirty = false;
        let mut kinds = Vec::new();

        if let Some(stock) = obs.stock {
            let now_in_stock = stock > 0;
            if !item.in_stock && now_in_stock {
                item.in_stock = true;
                dirty = true;
                kinds.push(ChangeKind::Restock);
            } else if item.in_stock && !now_in_stock {
                item.in_stock = false;
                dirty = true;
                kinds.push(ChangeKind::SoldOut);
            }
        }

        // Price comparison is independent of any stock transition
        if let Some(price_minor) = obs.price_minor {
            if price_minor != item.price_minor {
                item.price_minor = price_minor;
                dirty = true;
                kinds.push(ChangeKind::PriceChange);
            }
        }

        // URL drift is persisted without an alert
        if let Some(url) = url {
            if url != item.url {
                item.url = url.to_string();
                dirty = true;
            }
        }

        if !dirty {
            return;
        }

        self.known.insert(item.id.clone(), item.clone());
        self.changeset.record(item.clone());
        for kind in kinds {
            self.events.push(AlertEvent {
                item: item.clone(),
                kind,
                image_url: obs.image_url.clone(),
            });
        }
    }

    fn commit(&mut self, item: Item, kind: Option<ChangeKind>, image_url: Option<&str>) {
        self.known.insert(item.id.clone(), item.clone());
        self.changeset.record(item.clone());
        if let Some(kind) = kind {
            self.events.push(AlertEvent {
                item,
                kind,
                image_url: image_url.map(|s| s.to_string()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known_item(id: &str, price_minor: i64, in_stock: bool) -> Item {
        Item {
            id: id.to_string(),
            name: format!("Item {id}"),
            price_minor,
            in_stock,
            url: format!("https://shop.example.com/product/item-{id}"),
            is_priority: false,
        }
    }

    fn observation(id: &str, price_minor: i64, stock: u32) -> Observation {
        Observation {
            id: Some(id.to_string()),
            title: Some(format!("Item {id}")),
            price_minor: Some(price_minor),
            stock: Some(stock),
            image_url: None,
            kind: None,
        }
    }

    fn url_of(id: &str) -> String {
        format!("https://shop.example.com/product/item-{id}")
    }

    #[test]
    fn test_new_item_classified_once() {
        let mut rec = Reconciler::from_items(vec![]);
        rec.observe_listing(&observation("7", 1200, 5), Some(&url_of("7")));

        let outcome = rec.into_outcome();
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].kind, ChangeKind::NewItem);
        assert_eq!(outcome.changeset.len(), 1);
        assert!(outcome.changeset.get("7").unwrap().in_stock);
    }

    #[test]
    fn test_new_item_path_skips_incomplete_records() {
        let mut rec = Reconciler::from_items(vec![]);

        let mut no_price = observation("1", 0, 5);
        no_price.price_minor = None;
        rec.observe_listing(&no_price, Some(&url_of("1")));

        let mut no_title = observation("2", 500, 5);
        no_title.title = None;
        rec.observe_listing(&no_title, Some(&url_of("2")));

        rec.observe_listing(&observation("3", 500, 5), None);

        let outcome = rec.into_outcome();
        assert!(outcome.changeset.is_empty());
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn test_existing_item_kept_despite_missing_fields() {
        let mut rec = Reconciler::from_items(vec![known_item("7", 1200, true)]);

        let sparse = Observation {
            id: Some("7".to_string()),
            ..Observation::default()
        };
        rec.observe_listing(&sparse, None);

        let (known, outcome) = rec.into_parts();
        assert!(outcome.changeset.is_empty());
        assert!(known.contains_key("7"));
    }

    #[test]
    fn test_restock_example() {
        // Known {id:42, price:2500, inStock:false}; observed in stock again
        let mut rec = Reconciler::from_items(vec![known_item("42", 2500, false)]);
        rec.observe_listing(&observation("42", 2500, 3), Some(&url_of("42")));

        let outcome = rec.into_outcome();
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].kind, ChangeKind::Restock);
        assert!(outcome.changeset.get("42").unwrap().in_stock);
    }

    #[test]
    fn test_sold_out_classification() {
        let mut rec = Reconciler::from_items(vec![known_item("42", 2500, true)]);
        rec.observe_listing(&observation("42", 2500, 0), Some(&url_of("42")));

        let outcome = rec.into_outcome();
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].kind, ChangeKind::SoldOut);
    }

    #[test]
    fn test_price_change_independent_of_stock() {
        let mut rec = Reconciler::from_items(vec![known_item("42", 2500, false)]);
        rec.observe_listing(&observation("42", 1999, 3), Some(&url_of("42")));

        let outcome = rec.into_outcome();
        let kinds: Vec<ChangeKind> = outcome.events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Restock, ChangeKind::PriceChange]);
        // One changeset entry holding the final state after both updates
        assert_eq!(outcome.changeset.len(), 1);
        let item = outcome.changeset.get("42").unwrap();
        assert_eq!(item.price_minor, 1999);
        assert!(item.in_stock);
    }

    #[test]
    fn test_price_change_only() {
        let mut rec = Reconciler::from_items(vec![known_item("42", 2500, true)]);
        rec.observe_listing(&observation("42", 2600, 3), Some(&url_of("42")));

        let outcome = rec.into_outcome();
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].kind, ChangeKind::PriceChange);
        assert_eq!(outcome.changeset.get("42").unwrap().price_minor, 2600);
    }

    #[test]
    fn test_url_drift_updates_silently() {
        let mut rec = Reconciler::from_items(vec![known_item("42", 2500, true)]);
        rec.observe_listing(
            &observation("42", 2500, 3),
            Some("https://shop.example.com/product/renamed-42"),
        );

        let outcome = rec.into_outcome();
        assert!(outcome.events.is_empty());
        assert_eq!(
            outcome.changeset.get("42").unwrap().url,
            "https://shop.example.com/product/renamed-42"
        );
    }

    #[test]
    fn test_unchanged_item_stays_out_of_changeset() {
        let mut rec = Reconciler::from_items(vec![known_item("42", 2500, true)]);
        rec.observe_listing(&observation("42", 2500, 3), Some(&url_of("42")));

        let outcome = rec.into_outcome();
        assert!(outcome.changeset.is_empty());
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn test_reconcile_twice_is_idempotent() {
        let mut rec = Reconciler::from_items(vec![known_item("42", 2500, false)]);
        let obs = observation("42", 1999, 3);
        rec.observe_listing(&obs, Some(&url_of("42")));

        // Same observation against the already-updated map
        let (known, first) = rec.into_parts();
        assert!(first.has_changes());

        let mut rec = Reconciler::new(known);
        rec.observe_listing(&obs, Some(&url_of("42")));
        let second = rec.into_outcome();
        assert!(second.changeset.is_empty());
        assert!(second.events.is_empty());
    }

    #[test]
    fn test_probe_restock_and_sold_out() {
        let mut rec = Reconciler::from_items(vec![
            known_item("a", 100, false),
            known_item("b", 200, true),
            known_item("c", 300, true),
        ]);

        rec.observe_stock("a", true, Some("https://img.example.com/a.jpg"));
        rec.observe_stock("b", false, None);
        rec.observe_stock("c", true, None); // unchanged

        let outcome = rec.into_outcome();
        let kinds: Vec<ChangeKind> = outcome.events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Restock, ChangeKind::SoldOut]);
        assert_eq!(outcome.changeset.len(), 2);
        assert!(!outcome.changeset.contains("c"));
    }

    #[test]
    fn test_probe_unknown_id_ignored() {
        let mut rec = Reconciler::from_items(vec![]);
        rec.observe_stock("ghost", true, None);
        assert!(!rec.into_outcome().has_changes());
    }

    #[test]
    fn test_events_keep_observation_order() {
        let mut rec = Reconciler::from_items(vec![known_item("b", 200, false)]);
        rec.observe_listing(&observation("z", 900, 1), Some(&url_of("z")));
        rec.observe_listing(&observation("b", 200, 4), Some(&url_of("b")));

        let outcome = rec.into_outcome();
        assert_eq!(outcome.events[0].item.id, "z");
        assert_eq!(outcome.events[1].item.id, "b");
    }
}
