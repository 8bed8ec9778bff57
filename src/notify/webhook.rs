//! Webhook notifier.
//!
//! Posts Discord-style embeds. Product alerts and operator alerts go to
//! separate webhook URLs so a fatal message never drowns in product noise.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::NotifyConfig;
use crate::notify::{Alert, Notifier};

/// Notifier posting alerts to configured webhooks.
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
    operator_webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        if config.webhook_url.trim().is_empty() {
            return Err(AppError::config("notify.webhook_url is not set"));
        }
        let operator_webhook_url = if config.operator_webhook_url.trim().is_empty() {
            // Operator alerts fall back to the product channel
            config.webhook_url.clone()
        } else {
            config.operator_webhook_url.clone()
        };

        Ok(Self {
            client: Client::new(),
            webhook_url: config.webhook_url.clone(),
            operator_webhook_url,
        })
    }

    fn payload(alert: &Alert) -> serde_json::Value {
        let mut embed = json!({
            "title": alert.title,
            "description": alert.message,
            "timestamp": alert.timestamp.to_rfc3339(),
        });

        let mut fields = Vec::new();
        if let Some(price_minor) = alert.price_minor {
            fields.push(json!({
                "name": "Price",
                "value": format!("{}.{:02}", price_minor / 100, (price_minor % 100).abs()),
                "inline": true,
            }));
        }
        if let Some(in_stock) = alert.in_stock {
            fields.push(json!({
                "name": "Stock",
                "value": if in_stock { "in stock" } else { "sold out" },
                "inline": true,
            }));
        }
        if !fields.is_empty() {
            embed["fields"] = json!(fields);
        }
        if let Some(image_url) = &alert.image_url {
            embed["image"] = json!({ "url": image_url });
        }

        json!({ "embeds": [embed] })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, alert: &Alert) -> Result<()> {
        let url = if alert.operator {
            &self.operator_webhook_url
        } else {
            &self.webhook_url
        };

        let response = self
            .client
            .post(url)
            .json(&Self::payload(alert))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::notify(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_includes_fields_and_image() {
        let alert = Alert {
            title: "Back in stock: Ceramic Mug".to_string(),
            message: "Ceramic Mug is back in stock".to_string(),
            price_minor: Some(2500),
            in_stock: Some(true),
            image_url: Some("https://img.example.com/mug.jpg".to_string()),
            timestamp: chrono::Utc::now(),
            operator: false,
        };

        let payload = WebhookNotifier::payload(&alert);
        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"], "Back in stock: Ceramic Mug");
        assert_eq!(embed["fields"][0]["value"], "25.00");
        assert_eq!(embed["fields"][1]["value"], "in stock");
        assert_eq!(embed["image"]["url"], "https://img.example.com/mug.jpg");
    }

    #[test]
    fn test_payload_operator_alert_is_bare() {
        let payload = WebhookNotifier::payload(&Alert::operator("down"));
        let embed = &payload["embeds"][0];
        assert!(embed.get("fields").is_none());
        assert!(embed.get("image").is_none());
    }

    #[test]
    fn test_new_requires_webhook_url() {
        let config = NotifyConfig::default();
        assert!(WebhookNotifier::new(&config).is_err());
    }

    #[test]
    fn test_operator_url_falls_back() {
        let config = NotifyConfig {
            webhook_url: "https://hooks.example.com/products".to_string(),
            operator_webhook_url: String::new(),
        };
        let notifier = WebhookNotifier::new(&config).unwrap();
        assert_eq!(notifier.operator_webhook_url, notifier.webhook_url);
    }
}
