//! Persistence boundary for daily logs.
//!
//! A store offers two calls, both scoped by an explicit user id:
//!
//! 1. `fetch_range` returns every log with `start <= date <= end`; an empty
//!    result means no activity, not an error
//! 2. `upsert` writes a whole record keyed by `(user_id, date)`, replacing any
//!    existing row, and returns the row as stored
//!
//! All merge logic happens before `upsert` is called, so sending the same log
//! twice leaves the store unchanged.

mod error;
mod memory;
mod retry;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use retry::{RetryPolicy, RetryingStore};

use async_trait::async_trait;

use crate::date_key::DateKey;
use crate::models::DailyLog;

#[async_trait]
pub trait DailyLogStore: Send + Sync {
    async fn fetch_range(
        &self,
        user_id: &str,
        start: DateKey,
        end: DateKey,
    ) -> Result<Vec<DailyLog>, StoreError>;

    async fn upsert(&self, user_id: &str, log: &DailyLog) -> Result<DailyLog, StoreError>;
}

#[async_trait]
impl<S: DailyLogStore + ?Sized> DailyLogStore for Box<S> {
    async fn fetch_range(
        &self,
        user_id: &str,
        start: DateKey,
        end: DateKey,
    ) -> Result<Vec<DailyLog>, StoreError> {
        (**self).fetch_range(user_id, start, end).await
    }

    async fn upsert(&self, user_id: &str, log: &DailyLog) -> Result<DailyLog, StoreError> {
        (**self).upsert(user_id, log).await
    }
}
