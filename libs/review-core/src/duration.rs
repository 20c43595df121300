//! Elapsed-time value type normalized to whole seconds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// An elapsed time stored as signed whole seconds.
///
/// Negative values only appear in intermediate arithmetic; stored intervals
/// are never negative. There is no `From<i64>`; construct through
/// the named unit constructors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Duration {
    seconds: i64,
}

impl Duration {
    pub const ZERO: Duration = Duration { seconds: 0 };

    pub const fn from_seconds(seconds: i64) -> Self {
        Self { seconds }
    }

    pub const fn from_minutes(minutes: i64) -> Self {
        Self::from_seconds(minutes * SECONDS_PER_MINUTE)
    }

    pub const fn from_hours(hours: i64) -> Self {
        Self::from_seconds(hours * SECONDS_PER_HOUR)
    }

    pub const fn from_days(days: i64) -> Self {
        Self::from_seconds(days * SECONDS_PER_DAY)
    }

    /// Build from fractional days, rounding to the nearest second.
    pub fn from_days_f64(days: f64) -> Self {
        Self::from_seconds((days * SECONDS_PER_DAY as f64).round() as i64)
    }

    pub const fn seconds(self) -> i64 {
        self.seconds
    }

    pub fn minutes(self) -> f64 {
        self.seconds as f64 / SECONDS_PER_MINUTE as f64
    }

    pub fn hours(self) -> f64 {
        self.seconds as f64 / SECONDS_PER_HOUR as f64
    }

    pub fn days(self) -> f64 {
        self.seconds as f64 / SECONDS_PER_DAY as f64
    }

    pub const fn is_negative(self) -> bool {
        self.seconds < 0
    }

    /// Multiply by a growth factor, rounding to the nearest second.
    pub fn scale(self, factor: f64) -> Self {
        Self::from_seconds((self.seconds as f64 * factor).round() as i64)
    }

    /// Convert to a chrono duration, saturating at chrono's range.
    pub fn to_chrono(self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.seconds).unwrap_or(if self.seconds < 0 {
            chrono::Duration::MIN
        } else {
            chrono::Duration::MAX
        })
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Duration::from_seconds(self.seconds.saturating_add(rhs.seconds))
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Duration {
        Duration::from_seconds(self.seconds.saturating_sub(rhs.seconds))
    }
}

impl fmt::Display for Duration {
    /// Compact label in the largest whole unit, e.g. `10m` or `4d`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.seconds.abs();
        let sign = if self.seconds < 0 { "-" } else { "" };
        if abs >= SECONDS_PER_DAY {
            write!(f, "{}{}d", sign, (abs as f64 / SECONDS_PER_DAY as f64).round() as i64)
        } else if abs >= SECONDS_PER_HOUR {
            write!(f, "{}{}h", sign, (abs as f64 / SECONDS_PER_HOUR as f64).round() as i64)
        } else if abs >= SECONDS_PER_MINUTE {
            write!(f, "{}{}m", sign, (abs as f64 / SECONDS_PER_MINUTE as f64).round() as i64)
        } else {
            write!(f, "{}{}s", sign, abs)
        }
    }
}
