//! Count-based day edits and their reconciliation against stored logs.
//!
//! The editor only knows "how many meals" and "how many cups of water".
//! [`reconcile`] turns those counts back into a full [`DailyLog`]:
//!
//! - growing the meal count appends zero-macro `snack` placeholders named
//!   `Meal {n}` (n is the 1-based position of the new meal)
//! - shrinking it truncates from the tail, discarding whatever those meals held
//! - totals are always recomputed from the resulting meals

use serde::Serialize;

use crate::date_key::DateKey;
use crate::models::{DailyLog, MealEntry};

/// Pending counts for the selected day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditBuffer {
    target_date: DateKey,
    pending_meal_count: u32,
    pending_water_count: u32,
}

impl EditBuffer {
    /// Seeds the counts from `existing`, or zeros when nothing is stored.
    pub fn start(date: DateKey, existing: Option<&DailyLog>) -> Self {
        Self {
            target_date: date,
            pending_meal_count: existing.map_or(0, |log| count_u32(log.meals.len())),
            pending_water_count: existing.map_or(0, |log| log.water_intake),
        }
    }

    pub fn target_date(&self) -> DateKey {
        self.target_date
    }

    pub fn pending_meal_count(&self) -> u32 {
        self.pending_meal_count
    }

    pub fn pending_water_count(&self) -> u32 {
        self.pending_water_count
    }

    pub fn increment_meals(&mut self) {
        self.pending_meal_count = self.pending_meal_count.saturating_add(1);
    }

    pub fn decrement_meals(&mut self) {
        self.pending_meal_count = self.pending_meal_count.saturating_sub(1);
    }

    pub fn increment_water(&mut self) {
        self.pending_water_count = self.pending_water_count.saturating_add(1);
    }

    pub fn decrement_water(&mut self) {
        self.pending_water_count = self.pending_water_count.saturating_sub(1);
    }

    pub fn set_meals(&mut self, count: u32) {
        self.pending_meal_count = count;
    }

    pub fn set_water(&mut self, cups: u32) {
        self.pending_water_count = cups;
    }
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Merges `buffer` into `existing`, producing the record to write.
///
/// Pure: no I/O, and equal inputs always give equal output.
pub fn reconcile(existing: Option<&DailyLog>, buffer: &EditBuffer) -> DailyLog {
    let mut meals: Vec<MealEntry> = existing.map(|log| log.meals.clone()).unwrap_or_default();
    let target = buffer.pending_meal_count as usize;

    if target > meals.len() {
        let start = meals.len() + 1;
        meals.extend((start..=target).map(MealEntry::placeholder));
    } else {
        meals.truncate(target);
    }

    let date = existing.map_or(buffer.target_date, |log| log.date);
    let mut log = DailyLog::new(date)
        .with_meals(meals)
        .with_water(buffer.pending_water_count);
    log.id = existing.and_then(|l| l.id);

    log
}
