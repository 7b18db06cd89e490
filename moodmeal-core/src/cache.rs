//! Month-scoped cache of daily logs.

use std::collections::BTreeMap;

use crate::date_key::DateKey;
use crate::models::DailyLog;

/// Inclusive date range a cache was loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateKey,
    pub end: DateKey,
}

impl DateRange {
    pub fn new(start: DateKey, end: DateKey) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, key: &DateKey) -> bool {
        self.start <= *key && *key <= self.end
    }
}

/// DateKey to DailyLog mapping for the visible month.
///
/// Only whole fetch results and confirmed writes ever reach the cache.
#[derive(Debug, Clone, Default)]
pub struct LogCache {
    range: Option<DateRange>,
    entries: BTreeMap<DateKey, DailyLog>,
}

impl LogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cache with `logs`, dropping any that fall outside
    /// `[start, end]`. A later log for the same date wins.
    pub fn load(&mut self, start: DateKey, end: DateKey, logs: impl IntoIterator<Item = DailyLog>) {
        let range = DateRange::new(start, end);
        self.entries = logs
            .into_iter()
            .filter(|log| {
                let inside = range.contains(&log.date);
                if !inside {
                    tracing::debug!(date = %log.date, "Dropping log outside loaded range");
                }
                inside
            })
            .map(|log| (log.date, log))
            .collect();
        self.range = Some(range);
    }

    pub fn get(&self, key: &DateKey) -> Option<&DailyLog> {
        self.entries.get(key)
    }

    /// Inserts or replaces one entry. Returns false (and stores nothing)
    /// when a range is loaded and `key` lies outside it.
    pub fn put(&mut self, key: DateKey, log: DailyLog) -> bool {
        if let Some(range) = &self.range {
            if !range.contains(&key) {
                tracing::debug!(date = %key, "Ignoring put outside loaded range");
                return false;
            }
        }
        self.entries.insert(key, log);
        true
    }

    /// Empties the cache and forgets its range.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.range = None;
    }

    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in calendar order.
    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &DailyLog)> {
        self.entries.iter()
    }
}
