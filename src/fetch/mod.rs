//! Page fetching abstractions.
//!
//! A [`PageFetcher`] turns one navigation into exactly one parsed payload;
//! there is no shared mutable capture between calls, so a response is always
//! attributable to the URL that produced it.

mod http;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DetailPayload, ListingPage};

// Re-export for convenience
pub use http::HttpFetcher;

/// Trait for catalog page fetchers.
///
/// Implementations own the transport (direct JSON API calls here; a headless
/// browser interception layer would satisfy the same contract).
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page of the paginated listing endpoint.
    async fn fetch_listing(&self, url: &str) -> Result<ListingPage>;

    /// Fetch the detail payload for a single item page.
    async fn fetch_detail(&self, url: &str) -> Result<DetailPayload>;
}
