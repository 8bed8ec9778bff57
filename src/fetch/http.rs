//! HTTP-backed page fetcher.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::fetch::PageFetcher;
use crate::models::{DetailPayload, FetchConfig, ListingPage};
use crate::utils::url::get_domain;

/// Fetcher backed by a reqwest client.
///
/// Created lazily by the session controller and dropped after every full
/// catalog pass so long-lived connections cannot go stale.
pub struct HttpFetcher {
    client: Client,
    blocked_domains: Vec<String>,
}

impl HttpFetcher {
    /// Create a configured fetcher.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            blocked_domains: config.blocked_domains.clone(),
        })
    }

    /// Refuse navigation to configured blocked domains.
    fn check_blocklist(&self, url: &str) -> Result<()> {
        if self.blocked_domains.is_empty() {
            return Ok(());
        }
        let Some(domain) = get_domain(url) else {
            return Ok(());
        };
        if self
            .blocked_domains
            .iter()
            .any(|blocked| domain == *blocked || domain.ends_with(&format!(".{blocked}")))
        {
            return Err(AppError::validation(format!(
                "navigation to blocked domain: {domain}"
            )));
        }
        Ok(())
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.check_blocklist(url)?;
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_listing(&self, url: &str) -> Result<ListingPage> {
        self.fetch_json(url).await
    }

    async fn fetch_detail(&self, url: &str) -> Result<DetailPayload> {
        self.fetch_json(url).await
    }
}
