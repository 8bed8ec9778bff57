//! Priority probing: direct detail-page checks for high-demand items.
//!
//! Bypasses search pagination entirely. One bad detail page is counted and
//! skipped; an elevated failure ratio aborts the batch as a high-traffic
//! signal, which takes a different recovery path than ordinary page errors.

use crate::error::{AppError, Result};
use crate::fetch::PageFetcher;
use crate::models::{Item, MonitorConfig};
use crate::monitor::reconcile::Reconciler;

/// Probe every priority item's detail page and classify stock flips.
pub async fn run_probe_pass(
    fetcher: &dyn PageFetcher,
    monitor: &MonitorConfig,
    priority_items: &[Item],
    reconciler: &mut Reconciler,
) -> Result<()> {
    let total = priority_items.len();
    if total == 0 {
        log::info!("No priority items flagged, probe pass is a no-op");
        return Ok(());
    }

    let mut failed = 0usize;
    for item in priority_items {
        match fetcher.fetch_detail(&item.url).await {
            Ok(payload) => match payload.stock {
                Some(stock) => {
                    reconciler.observe_stock(&item.id, stock > 0, payload.image_url.as_deref());
                }
                None => {
                    failed += 1;
                    log::warn!("Probe {}: payload missing stock level", item.id);
                }
            },
            Err(e) => {
                failed += 1;
                log::warn!("Probe {} failed: {e}", item.id);
            }
        }

        if failed as f64 / total as f64 > monitor.probe_failure_ratio {
            log::error!("Probe failure ratio exceeded: {failed}/{total}");
            return Err(AppError::HighTraffic { failed, total });
        }
    }

    log::info!("Probed {total} priority items ({failed} failures)");
    Ok(())
}
