//! Calendar date keys.
//!
//! A [`DateKey`] is the only identity a daily log has. It is built from the
//! year/month/day a date carries in its own calendar, so a `DateTime<Local>`
//! late in the evening still maps to the day the user sees.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid date '{0}'. Use YYYY-MM-DD.")]
pub struct DateKeyError(pub String);

/// Canonical `YYYY-MM-DD` key for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Normalizes any calendar value to its key.
    ///
    /// Panics only if `date` carries components chrono itself would reject,
    /// which cannot happen for values produced by chrono.
    pub fn from_date<D: Datelike>(date: &D) -> Self {
        let naive = NaiveDate::from_ymd_opt(date.year(), date.month(), date.day())
            .expect("Datelike components form a valid date");
        Self(naive)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Key for the current day on the local clock.
    pub fn today() -> Self {
        Self::from_date(&Local::now())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = DateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), KEY_FORMAT)
            .map(Self)
            .map_err(|_| DateKeyError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn test_key_format_is_zero_padded() {
        let key = DateKey::from_ymd(2024, 3, 5).unwrap();
        assert_eq!(key.to_string(), "2024-03-05");
    }

    #[test]
    fn test_from_date_uses_local_components() {
        // 23:30 at UTC-8 is already the next day in UTC
        let offset = FixedOffset::west_opt(8 * 3600).unwrap();
        let late = offset.with_ymd_and_hms(2024, 3, 5, 23, 30, 0).unwrap();

        assert_eq!(DateKey::from_date(&late).to_string(), "2024-03-05");
    }

    #[test]
    fn test_from_date_is_idempotent() {
        let key = DateKey::from_ymd(2025, 12, 31).unwrap();
        let again = DateKey::from_date(&key.date());
        assert_eq!(key, again);
        assert_eq!(key.to_string(), again.to_string());
    }

    #[test]
    fn test_string_order_matches_calendar_order() {
        let dates = [
            DateKey::from_ymd(2024, 9, 30).unwrap(),
            DateKey::from_ymd(2024, 10, 1).unwrap(),
            DateKey::from_ymd(2024, 10, 10).unwrap(),
            DateKey::from_ymd(2025, 1, 2).unwrap(),
        ];
        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].to_string() < pair[1].to_string());
        }
    }

    #[test]
    fn test_parse() {
        let key: DateKey = "2024-02-29".parse().unwrap();
        assert_eq!(key, DateKey::from_ymd(2024, 2, 29).unwrap());

        assert!("2023-02-29".parse::<DateKey>().is_err());
        let err = "03/05/2024".parse::<DateKey>().unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_json_is_bare_string() {
        let key = DateKey::from_ymd(2024, 3, 5).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2024-03-05\"");
        let parsed: DateKey = serde_json::from_str("\"2024-03-05\"").unwrap();
        assert_eq!(parsed, key);
    }
}
