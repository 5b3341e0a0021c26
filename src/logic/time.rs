//! time utilities for conditions
//!
//! timestamps are milliseconds since the Unix epoch, UTC. supports:
//! - age units: "years", "months"
//! - window units: "years" (365 days), "months" (30 days), "weeks", "days",
//!   "hours", "minutes", "seconds", "milliseconds"
//! - timestamp strings: RFC 3339, "YYYY-MM-DD", or integer epoch millis

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// milliseconds since the Unix epoch
pub type Timestamp = i64;

const SECOND: i64 = 1000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// unit of an Age condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeUnit {
    Years,
    Months,
}

impl AgeUnit {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "years" => Some(AgeUnit::Years),
            "months" => Some(AgeUnit::Months),
            _ => None,
        }
    }
}

impl fmt::Display for AgeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeUnit::Years => write!(f, "years"),
            AgeUnit::Months => write!(f, "months"),
        }
    }
}

/// unit of a trailing time window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "years" => Some(TimeUnit::Years),
            "months" => Some(TimeUnit::Months),
            "weeks" => Some(TimeUnit::Weeks),
            "days" => Some(TimeUnit::Days),
            "hours" => Some(TimeUnit::Hours),
            "minutes" => Some(TimeUnit::Minutes),
            "seconds" => Some(TimeUnit::Seconds),
            "milliseconds" => Some(TimeUnit::Milliseconds),
            _ => None,
        }
    }

    /// length of one unit in milliseconds
    ///
    /// years and months are fixed lengths (365 and 30 days), not calendar
    /// arithmetic
    pub fn millis(self) -> i64 {
        match self {
            TimeUnit::Years => 365 * DAY,
            TimeUnit::Months => 30 * DAY,
            TimeUnit::Weeks => 7 * DAY,
            TimeUnit::Days => DAY,
            TimeUnit::Hours => HOUR,
            TimeUnit::Minutes => MINUTE,
            TimeUnit::Seconds => SECOND,
            TimeUnit::Milliseconds => 1,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeUnit::Years => "years",
            TimeUnit::Months => "months",
            TimeUnit::Weeks => "weeks",
            TimeUnit::Days => "days",
            TimeUnit::Hours => "hours",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Milliseconds => "milliseconds",
        };
        f.write_str(s)
    }
}

/// a trailing window such as "within 2 years"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub quantity: i64,
    pub unit: TimeUnit,
}

impl Window {
    pub fn millis(&self) -> i64 {
        self.quantity.saturating_mul(self.unit.millis())
    }

    /// start of the window ending at `time`
    pub fn start(&self, time: Timestamp) -> Timestamp {
        time.saturating_sub(self.millis())
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.quantity, self.unit)
    }
}

pub fn to_datetime(time: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(time)
}

/// calendar year of a timestamp (UTC)
pub fn year_of(time: Timestamp) -> Option<i64> {
    to_datetime(time).map(|dt| i64::from(dt.year()))
}

/// whole units elapsed from `from` to `to`, negative if `to` is earlier
///
/// uses the fixed unit lengths of [`TimeUnit::millis`], so 3650 days is
/// 10 years
pub fn elapsed_units(from: Timestamp, to: Timestamp, unit: TimeUnit) -> i64 {
    to.saturating_sub(from) / unit.millis()
}

/// parse a timestamp given as RFC 3339, "YYYY-MM-DD" (midnight UTC), or epoch millis
pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let s = s.trim();

    if let Ok(millis) = s.parse::<i64>() {
        return Some(millis);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
