//! Calendar-day bucket identifier.

use std::fmt;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Epoch seconds of the UTC midnight that starts a day.
///
/// Every instant within the same UTC calendar day maps to the same key, and
/// keys order the same way the days do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(i64);

const SECS_PER_DAY: i64 = 86_400;

impl DayKey {
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let midnight = at.date_naive().and_time(NaiveTime::MIN);
        DayKey(Utc.from_utc_datetime(&midnight).timestamp())
    }

    /// Wrap a stored value. Values that are not a midnight are truncated to one.
    pub fn from_secs(secs: i64) -> Self {
        DayKey(secs.div_euclid(SECS_PER_DAY) * SECS_PER_DAY)
    }

    pub fn as_secs(self) -> i64 {
        self.0
    }

    /// `YYYY-MM-DD`.
    pub fn to_date_string(self) -> String {
        match DateTime::<Utc>::from_timestamp(self.0, 0) {
            Some(dt) => dt.format("%Y-%m-%d").to_string(),
            None => self.0.to_string(),
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_date_string())
    }
}

impl From<DayKey> for i64 {
    fn from(k: DayKey) -> i64 {
        k.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_day_same_key() {
        let morning = Utc.with_ymd_and_hms(2024, 5, 17, 0, 0, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 5, 17, 23, 59, 59).unwrap();
        assert_eq!(DayKey::from_datetime(morning), DayKey::from_datetime(night));
        assert_eq!(DayKey::from_datetime(night).as_secs(), morning.timestamp());
    }

    #[test]
    fn midnight_starts_a_new_bucket() {
        let before = Utc.with_ymd_and_hms(2024, 5, 17, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 5, 18, 0, 0, 1).unwrap();
        let a = DayKey::from_datetime(before);
        let b = DayKey::from_datetime(after);
        assert!(a < b);
        assert_eq!(b.as_secs() - a.as_secs(), SECS_PER_DAY);
    }

    #[test]
    fn renders_iso_date() {
        let at = Utc.with_ymd_and_hms(2023, 1, 9, 15, 30, 0).unwrap();
        assert_eq!(DayKey::from_datetime(at).to_string(), "2023-01-09");
    }

    #[test]
    fn from_secs_truncates_to_midnight() {
        let at = Utc.with_ymd_and_hms(2023, 1, 9, 15, 30, 0).unwrap();
        assert_eq!(DayKey::from_secs(at.timestamp()), DayKey::from_datetime(at));
        assert_eq!(DayKey::from_secs(-1).as_secs(), -SECS_PER_DAY);
    }
}
