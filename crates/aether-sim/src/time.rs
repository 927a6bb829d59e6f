//! Simulated calendar time.
//!
//! This module provides the date-time types driven by the world clock:
//! - `WorldDateTime`: a totally ordered calendar timestamp
//! - `TickRate`: the fixed simulated quantum added per time advance
//! - Time-of-day derivation (`hour + minute / 60`) used by the sky model

use std::fmt;

use aether_common::ConfigError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Hour the clock starts at when no persisted time exists.
pub const DEFAULT_START_HOUR: u32 = 12;
/// Hours in a simulated day.
pub const HOURS_PER_DAY: f32 = 24.0;
/// Minutes in a simulated hour.
const MINUTES_PER_HOUR: f32 = 60.0;

/// A simulated calendar timestamp.
///
/// Only ever moved forward by the world clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldDateTime(NaiveDateTime);

impl Default for WorldDateTime {
    /// 0001-01-01 12:00, a Monday.
    fn default() -> Self {
        Self::epoch().saturating_add(TimeDelta::hours(i64::from(DEFAULT_START_HOUR)))
    }
}

impl WorldDateTime {
    /// Midnight on 0001-01-01.
    #[must_use]
    pub fn epoch() -> Self {
        let midnight = NaiveDate::from_ymd_opt(1, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self(midnight)
    }

    /// Wraps an existing chrono timestamp.
    #[must_use]
    pub const fn from_naive(inner: NaiveDateTime) -> Self {
        Self(inner)
    }

    /// Creates a timestamp from calendar components.
    ///
    /// Returns `None` for invalid dates or times.
    #[must_use]
    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .map(Self)
    }

    /// Returns the underlying chrono timestamp.
    #[must_use]
    pub const fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Calendar year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Calendar month (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Day of the month (1-31).
    #[must_use]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Hour of the day (0-23).
    #[must_use]
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// Minute of the hour (0-59).
    #[must_use]
    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// Second of the minute (0-59).
    #[must_use]
    pub fn second(&self) -> u32 {
        self.0.second()
    }

    /// Day of the week.
    #[must_use]
    pub fn day_of_week(&self) -> Weekday {
        self.0.weekday()
    }

    /// Time of day in hours, `hour + minute / 60`, within [0, 24).
    #[must_use]
    pub fn time_of_day(&self) -> f32 {
        self.hour() as f32 + self.minute() as f32 / MINUTES_PER_HOUR
    }

    /// Adds a span, staying put if the calendar would overflow.
    #[must_use]
    pub fn saturating_add(self, delta: TimeDelta) -> Self {
        self.0.checked_add_signed(delta).map_or(self, Self)
    }

    /// Adds one tick quantum.
    #[must_use]
    pub fn advanced_by(self, tick_rate: TickRate) -> Self {
        self.saturating_add(tick_rate.as_delta())
    }

    /// Signed span from `earlier` to `self`.
    #[must_use]
    pub fn since(&self, earlier: WorldDateTime) -> TimeDelta {
        self.0.signed_duration_since(earlier.0)
    }

    /// Formatted clock time (HH:MM).
    #[must_use]
    pub fn format_time(&self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }
}

impl fmt::Display for WorldDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Fixed simulated time added on every time advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate(TimeDelta);

impl Default for TickRate {
    /// One simulated minute per advance.
    fn default() -> Self {
        Self(TimeDelta::minutes(1))
    }
}

impl TickRate {
    /// Creates a tick rate from a positive number of simulated seconds.
    pub fn from_seconds(seconds: i64) -> Result<Self, ConfigError> {
        if seconds <= 0 {
            return Err(ConfigError::NonPositiveTickRate { seconds });
        }
        TimeDelta::try_seconds(seconds)
            .map(Self)
            .ok_or(ConfigError::NonPositiveTickRate { seconds })
    }

    /// Creates a tick rate from a chrono span.
    pub fn from_delta(delta: TimeDelta) -> Result<Self, ConfigError> {
        if delta <= TimeDelta::zero() {
            return Err(ConfigError::NonPositiveTickRate {
                seconds: delta.num_seconds(),
            });
        }
        Ok(Self(delta))
    }

    /// Returns the quantum as a chrono span.
    #[must_use]
    pub const fn as_delta(self) -> TimeDelta {
        self.0
    }

    /// Returns the quantum in whole seconds.
    #[must_use]
    pub fn seconds(self) -> i64 {
        self.0.num_seconds()
    }
}
