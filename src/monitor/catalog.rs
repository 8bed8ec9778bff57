//! Full-catalog pass: sequential pagination and reconciliation.
//!
//! Pages are fetched one at a time; the total page count is discovered from
//! the first response. Page 1 failing through all retries aborts the pass,
//! later pages are skipped instead (a partial catalog is acceptable).

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::fetch::PageFetcher;
use crate::models::{ListingPage, MonitorConfig, Observation, SourceConfig};
use crate::monitor::reconcile::Reconciler;
use crate::utils::url::detail_url;

/// Page bookkeeping for one catalog pass.
#[derive(Debug, Default)]
pub struct PassStats {
    /// Failed attempts on page 1
    pub first_page_failures: u32,
    /// Failed attempts on pages >= 2
    pub page_failures: u32,
    /// Pages skipped after retry exhaustion
    pub pages_skipped: u32,
    /// Page count derived from the first response
    pub total_pages: u32,
}

/// Fetch every listing page and feed the observations to the reconciler.
pub async fn run_catalog_pass(
    fetcher: &dyn PageFetcher,
    source: &SourceConfig,
    monitor: &MonitorConfig,
    reconciler: &mut Reconciler,
) -> Result<PassStats> {
    let mut stats = PassStats::default();

    let first_url = source.listing_url(1);
    let first = fetch_with_retry(fetcher, &first_url, 1, monitor, &mut stats).await?;
    stats.total_pages = first.page_count();
    log::info!(
        "Catalog pass: {} items across {} pages",
        first.total_count,
        stats.total_pages
    );
    reconcile_page(reconciler, &first, &first_url, source);

    for page in 2..=stats.total_pages {
        let url = source.listing_url(page);
        match fetch_with_retry(fetcher, &url, page, monitor, &mut stats).await {
            Ok(listing) => reconcile_page(reconciler, &listing, &url, source),
            Err(e) => {
                stats.pages_skipped += 1;
                log::warn!("Skipping page {page} after retries: {e}");
            }
        }
    }

    Ok(stats)
}

async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    url: &str,
    page: u32,
    monitor: &MonitorConfig,
    stats: &mut PassStats,
) -> Result<ListingPage> {
    let attempts = monitor.page_retry_limit;
    for attempt in 1..=attempts {
        match fetcher.fetch_listing(url).await {
            Ok(listing) => return Ok(listing),
            Err(e) => {
                if page == 1 {
                    stats.first_page_failures += 1;
                } else {
                    stats.page_failures += 1;
                }
                log::warn!("Page {page} attempt {attempt}/{attempts} failed: {e}");
                if attempt < attempts && monitor.page_retry_delay_secs > 0 {
                    tokio::time::sleep(Duration::from_secs(monitor.page_retry_delay_secs)).await;
                }
            }
        }
    }
    Err(AppError::PageUnreachable { page, attempts })
}

fn reconcile_page(
    reconciler: &mut Reconciler,
    listing: &ListingPage,
    page_url: &str,
    source: &SourceConfig,
) {
    for obs in &listing.items {
        let url = canonical_url(obs, page_url, source);
        reconciler.observe_listing(obs, url.as_deref());
    }
}

/// Canonical detail-page URL for an observation.
///
/// Secret listings keep the paginated search URL itself since their detail
/// pages cannot be derived.
fn canonical_url(obs: &Observation, page_url: &str, source: &SourceConfig) -> Option<String> {
    if obs.is_secret() {
        return Some(page_url.to_string());
    }
    match (obs.title.as_deref(), obs.id.as_deref()) {
        (Some(title), Some(id)) => detail_url(&source.base_url, title, id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::DetailPayload;

    /// Fetcher replaying queued responses per URL.
    #[derive(Default)]
    struct ScriptedFetcher {
        listings: Mutex<HashMap<String, VecDeque<Result<ListingPage>>>>,
    }

    impl ScriptedFetcher {
        fn script(&self, url: &str, result: Result<ListingPage>) {
            self.listings
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(result);
        }

        fn fail(&self, url: &str, times: u32) {
            for _ in 0..times {
                self.script(
                    url,
                    Err(AppError::extraction("navigation", "connection timed out")),
                );
            }
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch_listing(&self, url: &str) -> Result<ListingPage> {
            self.listings
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(|queue| queue.pop_front())
                .unwrap_or_else(|| Err(AppError::extraction("navigation", "unscripted url")))
        }

        async fn fetch_detail(&self, _url: &str) -> Result<DetailPayload> {
            Err(AppError::extraction("navigation", "unscripted url"))
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

    fn page(total: u32, page_size: u32, items: Vec<Observation>) -> ListingPage {
        ListingPage {
            total_count: total,
            page_size,
            items,
        }
    }

    fn fast_monitor() -> MonitorConfig {
        MonitorConfig {
            page_retry_delay_secs: 0,
            ..MonitorConfig::default()
        }
    }

    fn source() -> SourceConfig {
        SourceConfig::default()
    }

    #[tokio::test]
    async fn test_first_page_failure_aborts_pass() {
        let source = source();
        let fetcher = ScriptedFetcher::default();
        fetcher.fail(&source.listing_url(1), 3);

        let mut reconciler = Reconciler::from_items(vec![]);
        let result = run_catalog_pass(&fetcher, &source, &fast_monitor(), &mut reconciler).await;

        match result {
            Err(AppError::PageUnreachable { page, attempts }) => {
                assert_eq!(page, 1);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected PageUnreachable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_page_retry_then_success() {
        let source = source();
        let fetcher = ScriptedFetcher::default();
        fetcher.fail(&source.listing_url(1), 2);
        fetcher.script(
            &source.listing_url(1),
            Ok(page(1, 20, vec![observation("a", 100, 1)])),
        );

        let mut reconciler = Reconciler::from_items(vec![]);
        let stats = run_catalog_pass(&fetcher, &source, &fast_monitor(), &mut reconciler)
            .await
            .unwrap();

        assert_eq!(stats.first_page_failures, 2);
        assert_eq!(stats.total_pages, 1);
        assert_eq!(reconciler.into_outcome().changeset.len(), 1);
    }

    #[tokio::test]
    async fn test_middle_page_failure_is_skipped() {
        let source = source();
        let fetcher = ScriptedFetcher::default();
        // 3 pages of 20; page 2 never responds
        fetcher.script(
            &source.listing_url(1),
            Ok(page(50, 20, vec![observation("p1", 100, 1)])),
        );
        fetcher.fail(&source.listing_url(2), 3);
        fetcher.script(
            &source.listing_url(3),
            Ok(page(50, 20, vec![observation("p3", 300, 1)])),
        );

        let mut reconciler = Reconciler::from_items(vec![]);
        let stats = run_catalog_pass(&fetcher, &source, &fast_monitor(), &mut reconciler)
            .await
            .unwrap();

        assert_eq!(stats.total_pages, 3);
        assert_eq!(stats.pages_skipped, 1);
        assert_eq!(stats.page_failures, 3);
        assert_eq!(stats.first_page_failures, 0);

        let outcome = reconciler.into_outcome();
        assert_eq!(outcome.changeset.len(), 2);
        assert!(outcome.changeset.contains("p1"));
        assert!(outcome.changeset.contains("p3"));
    }

    #[tokio::test]
    async fn test_page_count_drives_fetch_loop() {
        let source = source();
        let fetcher = ScriptedFetcher::default();
        fetcher.script(
            &source.listing_url(1),
            Ok(page(45, 20, vec![observation("a", 100, 1)])),
        );
        fetcher.script(
            &source.listing_url(2),
            Ok(page(45, 20, vec![observation("b", 200, 1)])),
        );
        fetcher.script(
            &source.listing_url(3),
            Ok(page(45, 20, vec![observation("c", 300, 1)])),
        );

        let mut reconciler = Reconciler::from_items(vec![]);
        let stats = run_catalog_pass(&fetcher, &source, &fast_monitor(), &mut reconciler)
            .await
            .unwrap();

        assert_eq!(stats.total_pages, 3);
        assert_eq!(reconciler.into_outcome().changeset.len(), 3);
    }

    #[tokio::test]
    async fn test_secret_listing_gets_search_page_url() {
        let source = source();
        let fetcher = ScriptedFetcher::default();
        let mut secret = observation("s1", 999, 1);
        secret.kind = Some("secret".to_string());
        fetcher.script(&source.listing_url(1), Ok(page(1, 20, vec![secret])));

        let mut reconciler = Reconciler::from_items(vec![]);
        run_catalog_pass(&fetcher, &source, &fast_monitor(), &mut reconciler)
            .await
            .unwrap();

        let outcome = reconciler.into_outcome();
        assert_eq!(outcome.changeset.get("s1").unwrap().url, source.listing_url(1));
    }
}
