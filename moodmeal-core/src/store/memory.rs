use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::{DailyLogStore, StoreError};
use crate::date_key::DateKey;
use crate::models::DailyLog;

/// In-process store keyed by `(user_id, date)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<(String, DateKey), DailyLog>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every row, ordered by user then date.
    pub fn rows(&self) -> Vec<(String, DailyLog)> {
        self.lock()
            .iter()
            .map(|((user, _), log)| (user.clone(), log.clone()))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<(String, DateKey), DailyLog>> {
        // Poisoning is ignored: rows are only ever inserted whole
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DailyLogStore for MemoryStore {
    async fn fetch_range(
        &self,
        user_id: &str,
        start: DateKey,
        end: DateKey,
    ) -> Result<Vec<DailyLog>, StoreError> {
        if start > end {
            return Ok(Vec::new());
        }
        let rows = self.lock();
        Ok(rows
            .range((user_id.to_string(), start)..=(user_id.to_string(), end))
            .map(|(_, log)| log.clone())
            .collect())
    }

    async fn upsert(&self, user_id: &str, log: &DailyLog) -> Result<DailyLog, StoreError> {
        let mut rows = self.lock();
        let key = (user_id.to_string(), log.date);
        let id = rows
            .get(&key)
            .and_then(|existing| existing.id)
            .or(log.id)
            .unwrap_or_else(Uuid::new_v4);

        let mut stored = log.clone();
        stored.id = Some(id);
        stored.recompute_totals();
        rows.insert(key, stored.clone());

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealEntry;

    fn key(day: u32) -> DateKey {
        DateKey::from_ymd(2024, 3, day).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_twice_is_idempotent() {
        let store = MemoryStore::new();
        let log = DailyLog::new(key(5))
            .with_meals(vec![MealEntry::placeholder(1)])
            .with_water(2);

        let first = store.upsert("user1", &log).await.unwrap();
        let after_first = store.rows();
        let second = store.upsert("user1", &log).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.rows(), after_first);
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_whole_record() {
        let store = MemoryStore::new();
        let original = DailyLog::new(key(5))
            .with_meals(vec![MealEntry::placeholder(1), MealEntry::placeholder(2)])
            .with_water(4);
        let stored = store.upsert("user1", &original).await.unwrap();

        let replacement = DailyLog::new(key(5)).with_water(1);
        let replaced = store.upsert("user1", &replacement).await.unwrap();

        assert_eq!(replaced.id, stored.id);
        assert!(replaced.meals.is_empty());
        assert_eq!(replaced.water_intake, 1);
    }

    #[tokio::test]
    async fn test_fetch_range_is_inclusive_and_per_user() {
        let store = MemoryStore::new();
        for day in [1, 15, 31] {
            store
                .upsert("user1", &DailyLog::new(key(day)).with_water(day))
                .await
                .unwrap();
        }
        store
            .upsert("user2", &DailyLog::new(key(15)).with_water(9))
            .await
            .unwrap();

        let logs = store.fetch_range("user1", key(1), key(31)).await.unwrap();
        let days: Vec<u32> = logs.iter().map(|l| l.date.day()).collect();
        assert_eq!(days, vec![1, 15, 31]);

        let middle = store.fetch_range("user1", key(2), key(30)).await.unwrap();
        assert_eq!(middle.len(), 1);

        let empty = store.fetch_range("nobody", key(1), key(31)).await.unwrap();
        assert!(empty.is_empty());
    }
}
