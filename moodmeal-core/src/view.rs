//! State of one calendar screen.
//!
//! [`CalendarView`] owns the month cache and the pending edit, and applies
//! store results only when they still belong to the current state:
//!
//! - every fetch bumps a generation counter; a fetch result is applied only
//!   if no newer fetch, month change, user change or close happened since
//! - a save result reaches the cache only if month and user are unchanged

use serde::Serialize;
use thiserror::Error;

use crate::cache::{DateRange, LogCache};
use crate::calendar::{build_grid, CalendarCell, Month, WeekStart};
use crate::date_key::DateKey;
use crate::edit::{reconcile, EditBuffer};
use crate::models::{DailyLog, ValidationError};
use crate::store::{DailyLogStore, StoreError};

/// Errors surfaced to the user when saving a day.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("No date selected.")]
    NoDateSelected,

    #[error("Please log in to save your day.")]
    NotSignedIn,

    #[error("Logs for {0} are not loaded yet.")]
    NotLoaded(DateKey),

    #[error("Invalid daily log: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Could not save. Please try again.")]
    Failed(#[source] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// A range read issued for one month under one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub user_id: String,
    pub month: Month,
    pub range: DateRange,
}

/// A reconciled record waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTicket {
    epoch: u64,
    pub user_id: String,
    pub log: DailyLog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchOutcome {
    /// Cache now holds the fetched logs
    Applied,
    /// Fetch failed; cache was emptied
    Failed,
    /// Result belonged to an older generation and was ignored
    Stale,
}

#[derive(Debug)]
pub struct CalendarView {
    user_id: Option<String>,
    month: Month,
    week_start: WeekStart,
    cache: LogCache,
    generation: u64,
    epoch: u64,
    edit: Option<EditBuffer>,
}

impl CalendarView {
    pub fn new(user_id: Option<String>, month: Month) -> Self {
        Self {
            user_id,
            month,
            week_start: WeekStart::default(),
            cache: LogCache::new(),
            generation: 0,
            epoch: 0,
            edit: None,
        }
    }

    pub fn with_week_start(mut self, week_start: WeekStart) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    pub fn cache(&self) -> &LogCache {
        &self.cache
    }

    pub fn log_for(&self, date: &DateKey) -> Option<&DailyLog> {
        self.cache.get(date)
    }

    /// Drops the cache and any pending results.
    fn invalidate(&mut self) {
        self.generation += 1;
        self.epoch += 1;
        self.cache.clear();
    }

    /// Switches to `month`; in-flight fetches for the old month become stale
    /// and the open edit is dropped.
    pub fn show_month(&mut self, month: Month) {
        if month != self.month {
            tracing::debug!(from = %self.month, to = %month, "Changing month");
            self.month = month;
            self.edit = None;
            self.invalidate();
        }
    }

    /// Moves one month back or forward. Stays put at the edge of the
    /// representable calendar.
    pub fn navigate(&mut self, direction: Direction) {
        let target = match direction {
            Direction::Prev => self.month.prev(),
            Direction::Next => self.month.next(),
        };
        if let Some(month) = target {
            self.show_month(month);
        }
    }

    pub fn switch_user(&mut self, user_id: Option<String>) {
        if user_id != self.user_id {
            self.user_id = user_id;
            self.edit = None;
            self.invalidate();
        }
    }

    pub fn logout(&mut self) {
        self.switch_user(None);
    }

    /// Leaves the screen: nothing in flight may touch state afterwards.
    pub fn close(&mut self) {
        self.edit = None;
        self.invalidate();
    }

    /// Starts a range read for the active month.
    ///
    /// Returns `None` without a signed-in user; the cache is left empty.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        self.generation += 1;
        let Some(user_id) = self.user_id.clone() else {
            tracing::debug!("No user session, showing empty calendar");
            self.cache.clear();
            return None;
        };

        Some(FetchTicket {
            generation: self.generation,
            user_id,
            month: self.month,
            range: self.month.range(),
        })
    }

    /// Applies the result of `ticket` if it is still the latest fetch.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<DailyLog>, StoreError>,
    ) -> FetchOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(month = %ticket.month, "Discarding stale fetch result");
            return FetchOutcome::Stale;
        }

        match result {
            Ok(logs) => {
                tracing::debug!(month = %ticket.month, count = logs.len(), "Loaded daily logs");
                self.cache.load(ticket.range.start, ticket.range.end, logs);
                FetchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(month = %ticket.month, "Error fetching daily logs: {}", e);
                self.cache.clear();
                FetchOutcome::Failed
            }
        }
    }

    /// Fetches the active month from `store` and applies it.
    pub async fn refresh<S>(&mut self, store: &S) -> FetchOutcome
    where
        S: DailyLogStore + ?Sized,
    {
        let Some(ticket) = self.begin_fetch() else {
            return FetchOutcome::Failed;
        };
        let result = store
            .fetch_range(&ticket.user_id, ticket.range.start, ticket.range.end)
            .await;
        self.complete_fetch(ticket, result)
    }

    /// Grid for the active month from the current cache.
    pub fn grid(&self) -> Vec<CalendarCell> {
        build_grid(self.month, self.week_start, &self.cache)
    }

    /// Opens an edit for `date`, seeded from the cached record.
    pub fn select_day(&mut self, date: DateKey) -> &mut EditBuffer {
        let buffer = EditBuffer::start(date, self.cache.get(&date));
        self.edit.insert(buffer)
    }

    pub fn edit(&self) -> Option<&EditBuffer> {
        self.edit.as_ref()
    }

    pub fn edit_mut(&mut self) -> Option<&mut EditBuffer> {
        self.edit.as_mut()
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    /// Reconciles the pending edit into the record to write.
    pub fn prepare_save(&self) -> Result<SaveTicket, SaveError> {
        let buffer = self.edit.as_ref().ok_or(SaveError::NoDateSelected)?;
        let user_id = self.user_id.clone().ok_or(SaveError::NotSignedIn)?;

        // Reconciling against a cache that never saw the date would replace
        // the stored record with an empty one
        let date = buffer.target_date();
        if !self.cache.range().is_some_and(|r| r.contains(&date)) {
            return Err(SaveError::NotLoaded(date));
        }

        let log = reconcile(self.cache.get(&buffer.target_date()), buffer);
        log.validate()?;

        Ok(SaveTicket {
            epoch: self.epoch,
            user_id,
            log,
        })
    }

    /// Applies the store's answer to `ticket`.
    ///
    /// On success the stored row replaces the cache entry and the edit
    /// closes. On failure cache and edit are untouched so the user can retry.
    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<DailyLog, StoreError>,
    ) -> Result<DailyLog, SaveError> {
        let stored = result.map_err(|e| {
            tracing::warn!(date = %ticket.log.date, "Error saving daily log: {}", e);
            SaveError::Failed(e)
        })?;

        if ticket.epoch != self.epoch {
            tracing::debug!(date = %stored.date, "Save finished after state changed, cache untouched");
            return Ok(stored);
        }

        self.cache.put(stored.date, stored.clone());
        if self
            .edit
            .as_ref()
            .is_some_and(|e| e.target_date() == stored.date)
        {
            self.edit = None;
        }
        tracing::info!(date = %stored.date, meals = stored.meals.len(), water = stored.water_intake, "Saved daily log");

        Ok(stored)
    }

    /// Reconciles, writes and applies the pending edit.
    pub async fn save<S>(&mut self, store: &S) -> Result<DailyLog, SaveError>
    where
        S: DailyLogStore + ?Sized,
    {
        let ticket = self.prepare_save()?;
        let result = store.upsert(&ticket.user_id, &ticket.log).await;
        self.complete_save(ticket, result)
    }
}
