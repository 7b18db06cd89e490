use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use super::{DailyLogStore, StoreError};
use crate::date_key::DateKey;
use crate::models::DailyLog;

/// How often and how patiently to repeat a failed store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled after each failure
    pub initial_backoff: Duration,
    /// Upper bound on any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    async fn run<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, StoreError>> + Send,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        op,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Store call failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Wraps a store and repeats calls that fail with retryable errors.
///
/// Safe for `upsert` because a full-record replace is idempotent.
#[derive(Debug)]
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: DailyLogStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DailyLogStore> DailyLogStore for RetryingStore<S> {
    async fn fetch_range(
        &self,
        user_id: &str,
        start: DateKey,
        end: DateKey,
    ) -> Result<Vec<DailyLog>, StoreError> {
        self.policy
            .run("fetch_range", || self.inner.fetch_range(user_id, start, end))
            .await
    }

    async fn upsert(&self, user_id: &str, log: &DailyLog) -> Result<DailyLog, StoreError> {
        self.policy
            .run("upsert", || self.inner.upsert(user_id, log))
            .await
    }
}
