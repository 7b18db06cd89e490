//! Month values and the calendar grid derived from a [`LogCache`].

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::cache::{DateRange, LogCache};
use crate::date_key::DateKey;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS_FROM_SUNDAY: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("Invalid month '{0}'. Use YYYY-MM.")]
    Parse(String),
}

/// First column of the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Column index of `date` under this week start (0..=6).
    pub fn column(&self, date: NaiveDate) -> u32 {
        match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        }
    }

    /// Short weekday labels in column order.
    pub fn labels(&self) -> [&'static str; 7] {
        let offset = match self {
            WeekStart::Sunday => 0,
            WeekStart::Monday => 1,
        };
        std::array::from_fn(|i| WEEKDAYS_FROM_SUNDAY[(i + offset) % 7])
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekStart::Sunday => write!(f, "sunday"),
            WeekStart::Monday => write!(f, "monday"),
        }
    }
}

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    first: NaiveDate,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, CalendarError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| Self { first })
            .ok_or(CalendarError::InvalidMonth { year, month })
    }

    /// The month containing `key`.
    pub fn of(key: DateKey) -> Self {
        let date = key.date();
        Self {
            first: date - Days::new(u64::from(date.day0())),
        }
    }

    pub fn current() -> Self {
        Self::of(DateKey::today())
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    /// 1-based month number.
    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn name(&self) -> &'static str {
        MONTH_NAMES[self.first.month0() as usize]
    }

    /// Header text, e.g. "March 2024".
    pub fn title(&self) -> String {
        format!("{} {}", self.name(), self.year())
    }

    pub fn days_in_month(&self) -> u32 {
        match self.month() {
            2 if is_leap_year(self.year()) => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    pub fn first_day(&self) -> DateKey {
        DateKey::from(self.first)
    }

    pub fn last_day(&self) -> DateKey {
        DateKey::from(self.first + Days::new(u64::from(self.days_in_month() - 1)))
    }

    /// Key for `day` of this month, if it exists.
    pub fn day(&self, day: u32) -> Option<DateKey> {
        self.first.with_day(day).map(DateKey::from)
    }

    /// Inclusive range a fetch for this month covers.
    pub fn range(&self) -> DateRange {
        DateRange::new(self.first_day(), self.last_day())
    }

    pub fn contains(&self, key: &DateKey) -> bool {
        key.year() == self.year() && key.month() == self.month()
    }

    pub fn next(&self) -> Option<Self> {
        self.first
            .checked_add_months(Months::new(1))
            .map(|first| Self { first })
    }

    pub fn prev(&self) -> Option<Self> {
        self.first
            .checked_sub_months(Months::new(1))
            .map(|first| Self { first })
    }

    /// Blank cells before the 1st under `week_start`.
    pub fn leading_blanks(&self, week_start: WeekStart) -> u32 {
        week_start.column(self.first)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Month {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || CalendarError::Parse(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(parse_err)?;
        let year: i32 = year.parse().map_err(|_| parse_err())?;
        let month: u32 = month.parse().map_err(|_| parse_err())?;
        Self::new(year, month).map_err(|_| parse_err())
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Summary of one real day in the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    pub date: DateKey,
    pub day: u32,
    pub has_data: bool,
    pub meal_count: usize,
    pub water_count: u32,
    /// Total calories when a record exists for the day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CalendarCell {
    Blank,
    Day(DayCell),
}

impl CalendarCell {
    pub fn as_day(&self) -> Option<&DayCell> {
        match self {
            CalendarCell::Day(cell) => Some(cell),
            CalendarCell::Blank => None,
        }
    }
}

/// Grid for (`year`, `month`) with a Sunday week start.
pub fn build(year: i32, month: u32, cache: &LogCache) -> Result<Vec<CalendarCell>, CalendarError> {
    Ok(build_grid(Month::new(year, month)?, WeekStart::Sunday, cache))
}

/// Leading blanks followed by one cell per day of `month`.
///
/// Output depends only on the arguments; rebuilding is free of side effects.
pub fn build_grid(month: Month, week_start: WeekStart, cache: &LogCache) -> Vec<CalendarCell> {
    let blanks = month.leading_blanks(week_start);
    let days = month.days_in_month();
    let mut cells = Vec::with_capacity((blanks + days) as usize);

    cells.extend((0..blanks).map(|_| CalendarCell::Blank));

    for date in month.first.iter_days().take(days as usize) {
        let key = DateKey::from(date);
        let log = cache.get(&key);
        let meal_count = log.map_or(0, |l| l.meal_count());
        let water_count = log.map_or(0, |l| l.water_intake);

        cells.push(CalendarCell::Day(DayCell {
            date: key,
            day: date.day(),
            has_data: log.is_some_and(|l| l.has_activity()),
            meal_count,
            water_count,
            calories: log.map(|l| l.total_calories),
        }));
    }

    cells
}
