//! Top-level monitor loop and failure policy.
//!
//! Exactly one pass runs at a time. The controller selects a mode, routes
//! to the prober (throttle) or the full catalog pass (everything else),
//! persists the changeset, dispatches alerts in event order, and sleeps the
//! selected interval plus a bounded random jitter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::error::{AppError, Result};
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::models::{Config, Item};
use crate::monitor::catalog::run_catalog_pass;
use crate::monitor::probe::run_probe_pass;
use crate::monitor::reconcile::{PassOutcome, Reconciler};
use crate::monitor::schedule::{self, Mode};
use crate::notify::{Alert, Notifier};
use crate::store::ItemStore;

type FetcherFactory = Box<dyn Fn(&Config) -> Result<Arc<dyn PageFetcher>> + Send + Sync>;

/// Process-wide state threaded through the loop.
#[derive(Default)]
pub struct RunState {
    /// Non-traffic failures since the last successful pass
    pub consecutive_failures: u32,
    /// Mode selected for the current pass
    pub mode: Mode,
    /// Shared fetch transport, lazily created and torn down after every
    /// full catalog pass to avoid stale-connection timeouts
    fetcher: Option<Arc<dyn PageFetcher>>,
    /// Known-state map left over from the previous pass
    known_cache: Option<HashMap<String, Item>>,
    /// Whether the cache may be reused instead of reloading the store
    cache_valid: bool,
}

/// The monitor controller.
pub struct Monitor {
    config: Config,
    store: Arc<dyn ItemStore>,
    notifier: Arc<dyn Notifier>,
    fetcher_factory: FetcherFactory,
}

impl Monitor {
    pub fn new(config: Config, store: Arc<dyn ItemStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            store,
            notifier,
            fetcher_factory: Box::new(|config| {
                Ok(Arc::new(HttpFetcher::new(&config.fetch)?) as Arc<dyn PageFetcher>)
            }),
        }
    }

    /// Run the monitor loop until a fatal failure.
    pub async fn run(&self) -> Result<()> {
        let mut state = RunState::default();
        log::info!("Monitor loop starting");

        loop {
            let sleep_for = self.tick(&mut state, Local::now().naive_local()).await?;
            log::info!(
                "Sleeping {}s (mode {})",
                sleep_for.as_secs(),
                state.mode.as_str()
            );
            tokio::time::sleep(sleep_for).await;
        }
    }

    /// Execute one pass and return how long to sleep before the next.
    ///
    /// Returns an error only when the consecutive-failure limit is reached;
    /// everything else is absorbed into the returned delay.
    pub async fn tick(&self, state: &mut RunState, now: NaiveDateTime) -> Result<Duration> {
        let schedule = schedule::select(&self.config.schedule, now);
        state.mode = schedule.mode;
        log::info!(
            "Pass starting in {} mode (base interval {}s)",
            schedule.mode.as_str(),
            schedule.interval.as_secs()
        );

        match self.run_pass(state, schedule.mode).await {
            Ok(outcome) => {
                state.consecutive_failures = 0;
                self.dispatch(&outcome).await;
                Ok(schedule.interval + self.jitter())
            }
            Err(e) if e.is_high_traffic() => {
                log::warn!("{e}; cooling down");
                if let AppError::HighTraffic { failed, total } = e {
                    self.send_logged(&Alert::high_traffic(failed, total)).await;
                }
                Ok(Duration::from_secs(self.config.monitor.traffic_cooldown_secs))
            }
            Err(e) => {
                state.consecutive_failures += 1;
                log::error!(
                    "Pass failed ({}/{}): {e}",
                    state.consecutive_failures,
                    self.config.monitor.max_consecutive_failures
                );

                if state.consecutive_failures >= self.config.monitor.max_consecutive_failures {
                    let alert = Alert::operator(format!(
                        "Giving up after {} consecutive failures. Last error: {e}",
                        state.consecutive_failures
                    ));
                    self.send_logged(&alert).await;
                    return Err(AppError::FatalMonitor {
                        failures: state.consecutive_failures,
                    });
                }
                Ok(Duration::from_secs(
                    self.config.monitor.failure_retry_delay_secs,
                ))
            }
        }
    }

    async fn run_pass(&self, state: &mut RunState, mode: Mode) -> Result<PassOutcome> {
        let known = self.load_known(state).await?;
        let mut reconciler = Reconciler::new(known);

        if mode == Mode::Throttle {
            let priority = self.store.find_priority().await?;
            let fetcher = self.fetcher(state)?;
            run_probe_pass(
                fetcher.as_ref(),
                &self.config.monitor,
                &priority,
                &mut reconciler,
            )
            .await?;
        } else {
            let fetcher = self.fetcher(state)?;
            let result = run_catalog_pass(
                fetcher.as_ref(),
                &self.config.source,
                &self.config.monitor,
                &mut reconciler,
            )
            .await;
            // Torn down after every full catalog pass, success or not
            state.fetcher = None;
            result?;
        }

        let (known, outcome) = reconciler.into_parts();
        let changeset_empty = outcome.changeset.is_empty();
        if !changeset_empty {
            let items = outcome.changeset.clone().into_items();
            let written = self.store.bulk_upsert(&items).await?;
            log::info!("Persisted {written} changed items");
        }

        state.known_cache = Some(known);
        state.cache_valid = changeset_empty;
        Ok(outcome)
    }

    /// Known-state map: reuse the previous pass's cache when it was marked
    /// valid, otherwise reload from the store.
    async fn load_known(&self, state: &mut RunState) -> Result<HashMap<String, Item>> {
        if state.cache_valid {
            if let Some(cache) = state.known_cache.take() {
                log::debug!("Reusing cached known-state map ({} items)", cache.len());
                return Ok(cache);
            }
        }
        let items = self.store.find_all().await?;
        Ok(items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect())
    }

    fn fetcher(&self, state: &mut RunState) -> Result<Arc<dyn PageFetcher>> {
        if let Some(fetcher) = &state.fetcher {
            return Ok(Arc::clone(fetcher));
        }
        let fetcher = (self.fetcher_factory)(&self.config)?;
        state.fetcher = Some(Arc::clone(&fetcher));
        Ok(fetcher)
    }

    /// Dispatch one alert per event, in event order. Delivery failures are
    /// logged and never fail the pass.
    async fn dispatch(&self, outcome: &PassOutcome) {
        for event in &outcome.events {
            self.send_logged(&Alert::from_event(event)).await;
        }
    }

    async fn send_logged(&self, alert: &Alert) {
        if let Err(e) = self.notifier.send(alert).await {
            log::warn!("Alert delivery failed ({}): {e}", alert.title);
        }
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.config.monitor.jitter_max_secs * 1000;
        Duration::from_millis(fastrand::u64(0..=max_ms))
    }
}
