//! Calendar time units and window boundary computation
//!
//! A [`TimeUnit`] is both the length of a usage period and the width of the
//! slices it is cut into. Units are ranked `Second < Minute < Hour < Day`.

use super::ValidationError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest time increment separating the end of one window from the start
/// of the next.
pub const TIME_QUANTUM: TimeDelta = TimeDelta::nanoseconds(1);

/// Calendar unit used for period lengths and slice granularity
///
/// Variants are declared in rank order, so the derived `Ord` compares ranks.
///
/// # Example
///
/// ```
/// use quotaslice::TimeUnit;
///
/// let unit: TimeUnit = "HOUR".parse().unwrap();
/// assert!(TimeUnit::Minute < unit);
/// assert_eq!(unit.label(), "HOUR");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    /// All units in ascending rank order
    pub const ALL: [TimeUnit; 4] = [
        TimeUnit::Second,
        TimeUnit::Minute,
        TimeUnit::Hour,
        TimeUnit::Day,
    ];

    /// Ordinal position of the unit, starting at 0 for `Second`
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Length of one unit
    pub fn duration(self) -> TimeDelta {
        TimeDelta::seconds(self.seconds())
    }

    /// Configuration label of the unit
    pub fn label(self) -> &'static str {
        match self {
            TimeUnit::Second => "SECOND",
            TimeUnit::Minute => "MINUTE",
            TimeUnit::Hour => "HOUR",
            TimeUnit::Day => "DAY",
        }
    }

    fn seconds(self) -> i64 {
        match self {
            TimeUnit::Second => 1,
            TimeUnit::Minute => 60,
            TimeUnit::Hour => 3_600,
            TimeUnit::Day => 86_400,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeUnit::ALL
            .into_iter()
            .find(|unit| unit.label() == s)
            .ok_or_else(|| ValidationError::UnknownUnit(s.to_string()))
    }
}

/// Compute the calendar window of `unit` that contains `t`
///
/// The start is `t` with every component finer than `unit` zeroed; the end is
/// one [`TIME_QUANTUM`] before the start of the following window. Both ends
/// are inclusive.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use quotaslice::{aligned_bounds, TimeUnit};
///
/// let t = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
/// let (start, end) = aligned_bounds(t, TimeUnit::Hour);
///
/// assert_eq!(start, Utc.with_ymd_and_hms(2006, 1, 2, 15, 0, 0).unwrap());
/// assert_eq!(end.format("%H:%M:%S%.3f").to_string(), "15:59:59.999");
/// ```
pub fn aligned_bounds(t: DateTime<Utc>, unit: TimeUnit) -> (DateTime<Utc>, DateTime<Utc>) {
    // UTC has no leap seconds in chrono, so epoch-aligned flooring matches
    // the calendar for every unit up to a day.
    let secs = t.timestamp();
    let floored = secs - secs.rem_euclid(unit.seconds());
    let start = DateTime::from_timestamp(floored, 0).unwrap_or(t);

    let end = start
        .checked_add_signed(unit.duration() - TIME_QUANTUM)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    (start, end)
}
