//! Schedule presets and logical-date computation.
//!
//! The workflow never loops on its schedule. The schedule is used to work out
//! which data interval a single run covers: with catch-up disabled, that is
//! the most recent interval that has fully elapsed.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A schedule preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// Run a single time, covering the start date
    Once,
    /// Every hour (default)
    #[default]
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Schedule {
    /// Advance `from` by one interval. `None` for `@once` or on overflow.
    pub fn next_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Schedule::Once => None,
            Schedule::Hourly => from.checked_add_signed(Duration::hours(1)),
            Schedule::Daily => from.checked_add_signed(Duration::days(1)),
            Schedule::Weekly => from.checked_add_signed(Duration::weeks(1)),
            Schedule::Monthly => from.checked_add_months(Months::new(1)),
            Schedule::Yearly => from.checked_add_months(Months::new(12)),
        }
    }

    /// Fixed interval length, when the preset has one
    pub fn fixed_interval(&self) -> Option<Duration> {
        match self {
            Schedule::Hourly => Some(Duration::hours(1)),
            Schedule::Daily => Some(Duration::days(1)),
            Schedule::Weekly => Some(Duration::weeks(1)),
            Schedule::Once | Schedule::Monthly | Schedule::Yearly => None,
        }
    }

    /// Start of the most recent data interval that has fully elapsed at `now`.
    ///
    /// Intervals are aligned to `start_date`. Returns `None` when no interval
    /// has completed yet (or, for `@once`, when `now` is before the start date).
    pub fn latest_logical_date(
        &self,
        start_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if now < start_date {
            return None;
        }
        if *self == Schedule::Once {
            return Some(start_date);
        }

        if let Some(interval) = self.fixed_interval() {
            let elapsed = now.signed_duration_since(start_date);
            let completed = elapsed.num_seconds() / interval.num_seconds();
            if completed < 1 {
                return None;
            }
            let offset = Duration::seconds((completed - 1) * interval.num_seconds());
            return start_date.checked_add_signed(offset);
        }

        // Calendar intervals: walk forward one interval at a time
        let mut current = start_date;
        let mut latest = None;
        while let Some(end) = self.next_after(current) {
            if end > now {
                break;
            }
            latest = Some(current);
            current = end;
        }
        latest
    }

    fn as_preset(&self) -> &'static str {
        match self {
            Schedule::Once => "@once",
            Schedule::Hourly => "@hourly",
            Schedule::Daily => "@daily",
            Schedule::Weekly => "@weekly",
            Schedule::Monthly => "@monthly",
            Schedule::Yearly => "@yearly",
        }
    }
}

impl FromStr for Schedule {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "@once" => Ok(Schedule::Once),
            "@hourly" => Ok(Schedule::Hourly),
            "@daily" | "@midnight" => Ok(Schedule::Daily),
            "@weekly" => Ok(Schedule::Weekly),
            "@monthly" => Ok(Schedule::Monthly),
            "@yearly" | "@annually" => Ok(Schedule::Yearly),
            _ => Err(CoreError::InvalidSchedule {
                expression: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_preset())
    }
}

impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_preset())
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
