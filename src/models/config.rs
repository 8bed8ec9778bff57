//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetcher settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Catalog source endpoints
    #[serde(default)]
    pub source: SourceConfig,

    /// Hot-window and interval settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Retry, threshold, and cooldown settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Persistence settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Notification channel settings
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.source.base_url.trim().is_empty() {
            return Err(AppError::validation("source.base_url is empty"));
        }
        if !self.source.listing_path.contains("{page}") {
            return Err(AppError::validation(
                "source.listing_path must contain a {page} placeholder",
            ));
        }
        self.schedule.validate()?;
        self.monitor.validate()?;
        Ok(())
    }
}

/// HTTP fetcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-navigation timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Domains the fetcher refuses to contact (trackers, ad hosts)
    #[serde(default)]
    pub blocked_domains: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            blocked_domains: Vec::new(),
        }
    }
}

/// Catalog source endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Shop origin, no trailing slash
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Listing endpoint path with a `{page}` placeholder
    #[serde(default = "defaults::listing_path")]
    pub listing_path: String,
}

impl SourceConfig {
    /// Build the listing URL for a 1-based page number.
    pub fn listing_url(&self, page: u32) -> String {
        format!(
            "{}{}",
            self.base_url,
            self.listing_path.replace("{page}", &page.to_string())
        )
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            listing_path: defaults::listing_path(),
        }
    }
}

/// Hot-window and polling interval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Weekdays with expected demand spikes ("mon".."sun")
    #[serde(default = "defaults::hot_weekdays")]
    pub hot_weekdays: Vec<String>,

    /// Hot window start hour, inclusive (0-23)
    #[serde(default = "defaults::window_start_hour")]
    pub window_start_hour: u32,

    /// Hot window end hour, exclusive (1-24)
    #[serde(default = "defaults::window_end_hour")]
    pub window_end_hour: u32,

    /// Hours before the window during which cadence tightens
    #[serde(default = "defaults::prep_lead_hours")]
    pub prep_lead_hours: u32,

    /// Hours around window boundaries kept at medium cadence
    #[serde(default = "defaults::standby_margin_hours")]
    pub standby_margin_hours: u32,

    /// Shortest interval, used inside the hot window
    #[serde(default = "defaults::peak_interval")]
    pub peak_interval_secs: u64,

    /// Medium interval near window boundaries
    #[serde(default = "defaults::standby_interval")]
    pub standby_interval_secs: u64,

    /// Longest interval, used far from any window
    #[serde(default = "defaults::snooze_interval")]
    pub snooze_interval_secs: u64,
}

impl ScheduleConfig {
    /// Parse the configured weekday names.
    pub fn parsed_hot_weekdays(&self) -> Result<Vec<Weekday>> {
        self.hot_weekdays
            .iter()
            .map(|name| {
                Weekday::from_str(name).map_err(|_| {
                    AppError::validation(format!("schedule.hot_weekdays: unknown weekday {name:?}"))
                })
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        self.parsed_hot_weekdays()?;
        if self.window_start_hour >= 24 || self.window_end_hour > 24 {
            return Err(AppError::validation("schedule window hours out of range"));
        }
        if self.window_start_hour >= self.window_end_hour {
            return Err(AppError::validation(
                "schedule.window_start_hour must be before window_end_hour",
            ));
        }
        if self.peak_interval_secs == 0 {
            return Err(AppError::validation("schedule.peak_interval_secs must be > 0"));
        }
        if self.peak_interval_secs > self.standby_interval_secs
            || self.standby_interval_secs > self.snooze_interval_secs
        {
            return Err(AppError::validation(
                "schedule intervals must satisfy peak <= standby <= snooze",
            ));
        }
        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            hot_weekdays: defaults::hot_weekdays(),
            window_start_hour: defaults::window_start_hour(),
            window_end_hour: defaults::window_end_hour(),
            prep_lead_hours: defaults::prep_lead_hours(),
            standby_margin_hours: defaults::standby_margin_hours(),
            peak_interval_secs: defaults::peak_interval(),
            standby_interval_secs: defaults::standby_interval(),
            snooze_interval_secs: defaults::snooze_interval(),
        }
    }
}

/// Retry, threshold, and cooldown settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Consecutive failed passes before the process gives up
    #[serde(default = "defaults::max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// Attempts per page before aborting (page 1) or skipping (page >= 2)
    #[serde(default = "defaults::page_retry_limit")]
    pub page_retry_limit: u32,

    /// Delay between attempts on the same page
    #[serde(default = "defaults::page_retry_delay")]
    pub page_retry_delay_secs: u64,

    /// Delay before retrying after a failed pass
    #[serde(default = "defaults::failure_retry_delay")]
    pub failure_retry_delay_secs: u64,

    /// Cooldown after a high-traffic abort
    #[serde(default = "defaults::traffic_cooldown")]
    pub traffic_cooldown_secs: u64,

    /// Probe failure ratio above which the pass aborts as high traffic
    #[serde(default = "defaults::probe_failure_ratio")]
    pub probe_failure_ratio: f64,

    /// Upper bound for the random addition to every sleep interval
    #[serde(default = "defaults::jitter_max")]
    pub jitter_max_secs: u64,
}

impl MonitorConfig {
    fn validate(&self) -> Result<()> {
        if self.max_consecutive_failures == 0 {
            return Err(AppError::validation(
                "monitor.max_consecutive_failures must be > 0",
            ));
        }
        if self.page_retry_limit == 0 {
            return Err(AppError::validation("monitor.page_retry_limit must be > 0"));
        }
        if !(self.probe_failure_ratio > 0.0 && self.probe_failure_ratio <= 1.0) {
            return Err(AppError::validation(
                "monitor.probe_failure_ratio must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: defaults::max_consecutive_failures(),
            page_retry_limit: defaults::page_retry_limit(),
            page_retry_delay_secs: defaults::page_retry_delay(),
            failure_retry_delay_secs: defaults::failure_retry_delay(),
            traffic_cooldown_secs: defaults::traffic_cooldown(),
            probe_failure_ratio: defaults::probe_failure_ratio(),
            jitter_max_secs: defaults::jitter_max(),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the item snapshot
    #[serde(default = "defaults::store_dir")]
    pub dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: defaults::store_dir(),
        }
    }
}

/// Notification channel settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Webhook receiving product alerts
    #[serde(default)]
    pub webhook_url: String,

    /// Webhook receiving operator-only fatal alerts
    #[serde(default)]
    pub operator_webhook_url: String,
}

mod defaults {
    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; shelfwatch/1.0)".into()
    }
    pub fn timeout() -> u64 {
        100
    }

    // Source defaults
    pub fn base_url() -> String {
        "https://shop.example.com".into()
    }
    pub fn listing_path() -> String {
        "/api/catalog/search?page={page}".into()
    }

    // Schedule defaults
    pub fn hot_weekdays() -> Vec<String> {
        vec!["sat".into()]
    }
    pub fn window_start_hour() -> u32 {
        10
    }
    pub fn window_end_hour() -> u32 {
        14
    }
    pub fn prep_lead_hours() -> u32 {
        3
    }
    pub fn standby_margin_hours() -> u32 {
        2
    }
    pub fn peak_interval() -> u64 {
        30
    }
    pub fn standby_interval() -> u64 {
        300
    }
    pub fn snooze_interval() -> u64 {
        1800
    }

    // Monitor defaults
    pub fn max_consecutive_failures() -> u32 {
        5
    }
    pub fn page_retry_limit() -> u32 {
        3
    }
    pub fn page_retry_delay() -> u64 {
        5
    }
    pub fn failure_retry_delay() -> u64 {
        10
    }
    pub fn traffic_cooldown() -> u64 {
        1800
    }
    pub fn probe_failure_ratio() -> f64 {
        0.5
    }
    pub fn jitter_max() -> u64 {
        10
    }

    // Store defaults
    pub fn store_dir() -> String {
        "storage".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.fetch.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_page_placeholder() {
        let mut config = Config::default();
        config.source.listing_path = "/api/catalog/search".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_weekday() {
        let mut config = Config::default();
        config.schedule.hot_weekdays = vec!["caturday".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_intervals() {
        let mut config = Config::default();
        config.schedule.peak_interval_secs = 600;
        config.schedule.standby_interval_secs = 300;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_probe_ratio() {
        let mut config = Config::default();
        config.monitor.probe_failure_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_listing_url_substitution() {
        let source = SourceConfig::default();
        assert_eq!(
            source.listing_url(3),
            "https://shop.example.com/api/catalog/search?page=3"
        );
    }

    #[test]
    fn test_parsed_hot_weekdays() {
        let schedule = ScheduleConfig {
            hot_weekdays: vec!["sat".into(), "sunday".into()],
            ..ScheduleConfig::default()
        };
        let days = schedule.parsed_hot_weekdays().unwrap();
        assert_eq!(days, vec![Weekday::Sat, Weekday::Sun]);
    }
}
