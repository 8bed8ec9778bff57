//! Notification rendering and dispatch.
//!
//! The monitor core emits [`crate::models::AlertEvent`]s; this module
//! renders them into channel-agnostic [`Alert`]s and pushes them through a
//! [`Notifier`] backend.

pub mod console;
pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{AlertEvent, ChangeKind};

// Re-export for convenience
pub use console::ConsoleNotifier;
pub use webhook::WebhookNotifier;

/// A rendered notification.
#[derive(Debug, Clone)]
pub struct Alert {
    pub title: String,
    pub message: String,
    /// Price in the smallest currency unit, when a product is attached
    pub price_minor: Option<i64>,
    pub in_stock: Option<bool>,
    pub image_url: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Operator alerts carry no product payload and go to a separate channel
    pub operator: bool,
}

impl Alert {
    /// Render a classified change event.
    pub fn from_event(event: &AlertEvent) -> Self {
        let item = &event.item;
        let message = match event.kind {
            ChangeKind::NewItem => format!("{} just appeared in the catalog", item.name),
            ChangeKind::Restock => format!("{} is back in stock", item.name),
            ChangeKind::SoldOut => format!("{} just sold out", item.name),
            ChangeKind::PriceChange => {
                format!("{} now costs {}", item.name, format_price(item.price_minor))
            }
            ChangeKind::Other => format!("{} was updated", item.name),
        };

        Self {
            title: format!("{}: {}", event.kind.label(), item.name),
            message: format!("{message}\n{}", item.url),
            price_minor: Some(item.price_minor),
            in_stock: Some(item.in_stock),
            image_url: event.image_url.clone(),
            timestamp: Utc::now(),
            operator: false,
        }
    }

    /// The prober's threshold-trip alert. No product payload.
    pub fn high_traffic(failed: usize, total: usize) -> Self {
        Self {
            title: "High traffic detected".to_string(),
            message: format!(
                "{failed}/{total} priority probes failed; possible restock in progress. \
                 Cooling down."
            ),
            price_minor: None,
            in_stock: None,
            image_url: None,
            timestamp: Utc::now(),
            operator: false,
        }
    }

    /// Operator-only fatal alert, sent once before the process exits.
    pub fn operator(message: impl Into<String>) -> Self {
        Self {
            title: "Monitor down".to_string(),
            message: message.into(),
            price_minor: None,
            in_stock: None,
            image_url: None,
            timestamp: Utc::now(),
            operator: true,
        }
    }
}

/// Format a minor-unit price for display.
fn format_price(price_minor: i64) -> String {
    format!("{}.{:02}", price_minor / 100, (price_minor % 100).abs())
}

/// Trait for notification backends.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Push one rendered alert.
    async fn send(&self, alert: &Alert) -> Result<()>;
}
