//! Polling cadence selection.
//!
//! A pure function of wall-clock time and static configuration: no state is
//! carried between calls. Window boundaries are evaluated at whole-hour
//! granularity; minutes are truncated.

use std::time::Duration;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::models::ScheduleConfig;

/// Operating mode for the next pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Inside the hot window: shortest interval, priority probing
    Throttle,
    /// Shortly before the window: cadence tightens as it approaches
    Prep,
    /// Near a window boundary: medium interval
    Standby,
    /// Far from any window: longest interval
    #[default]
    Snooze,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Throttle => "throttle",
            Mode::Prep => "prep",
            Mode::Standby => "standby",
            Mode::Snooze => "snooze",
        }
    }
}

/// Selected mode plus the polling interval to sleep afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub mode: Mode,
    pub interval: Duration,
}

/// Compute the operating mode and interval for the given instant.
pub fn select(config: &ScheduleConfig, now: NaiveDateTime) -> Schedule {
    // Config is validated at startup; an unparsable weekday list would have
    // been rejected there
    let hot_days = config.parsed_hot_weekdays().unwrap_or_default();

    let hour = now.hour();
    let start = config.window_start_hour;
    let end = config.window_end_hour;

    if !hot_days.contains(&now.weekday()) {
        return Schedule {
            mode: Mode::Snooze,
            interval: Duration::from_secs(config.snooze_interval_secs),
        };
    }

    if hour >= start && hour < end {
        return Schedule {
            mode: Mode::Throttle,
            interval: Duration::from_secs(config.peak_interval_secs),
        };
    }

    if hour < start && start - hour <= config.prep_lead_hours {
        return Schedule {
            mode: Mode::Prep,
            interval: prep_interval(config, now),
        };
    }

    let near_start = hour < start && start - hour <= config.standby_margin_hours;
    let near_end = hour >= end && hour - end < config.standby_margin_hours;
    if near_start || near_end {
        return Schedule {
            mode: Mode::Standby,
            interval: Duration::from_secs(config.standby_interval_secs),
        };
    }

    Schedule {
        mode: Mode::Snooze,
        interval: Duration::from_secs(config.snooze_interval_secs),
    }
}

/// Interval scaled to the time remaining until the window opens: a quarter
/// of the remaining seconds, clamped between the peak and standby intervals.
fn prep_interval(config: &ScheduleConfig, now: NaiveDateTime) -> Duration {
    let seconds_of_day = u64::from(now.num_seconds_from_midnight());
    let window_start = u64::from(config.window_start_hour) * 3600;
    let remaining = window_start.saturating_sub(seconds_of_day);

    let scaled = (remaining / 4).clamp(config.peak_interval_secs, config.standby_interval_secs);
    Duration::from_secs(scaled)
}
