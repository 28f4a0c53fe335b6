//! Exponential backoff around any [`RecordStore`].
//!
//! Only transient failures (connection problems, 5xx, 429) are retried; a
//! rejected row fails straight away.
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use super::{RecordStore, Table};
use crate::error::PersistenceError;
use rand::{Rng, rng};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Wraps a store and retries transient upsert failures with backoff.
pub struct RetryStore<S> {
    inner: S,
    /// Extra attempts after the first one.
    max_retries: usize,
    /// Delay before the first retry; doubles on each further retry.
    base_delay: Duration,
    /// Cap on the doubled delay, before jitter.
    max_delay: Duration,
}

impl<S: RecordStore> RetryStore<S> {
    /// Wrap `inner`.
    ///
    /// # Arguments
    ///
    /// * `inner` - Store doing the actual writes.
    /// * `max_retries` - Retries per row after the first attempt; zero disables retrying.
    /// * `base_delay` - First backoff delay. Later ones double up to ten seconds.
    pub fn new(inner: S, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(10),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> fmt::Debug for RetryStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryStore")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<S: RecordStore> RecordStore for RetryStore<S> {
    #[instrument(level = "debug", skip(self, row))]
    async fn upsert(
        &self,
        table: Table,
        row: &Value,
        on_conflict: Option<&str>,
    ) -> Result<(), PersistenceError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let e = match self.inner.upsert(table, row, on_conflict).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            attempt += 1;
            let total_dt = total_t0.elapsed();

            if !e.is_transient() {
                return Err(e);
            }
            if attempt > self.max_retries {
                error!(
                    attempt,
                    max = self.max_retries,
                    elapsed_ms_total = total_dt.as_millis() as u64,
                    error = %e,
                    "upsert exhausted retries"
                );
                return Err(e);
            }

            // backoff calc
            let shift = u32::try_from(attempt - 1).unwrap_or(u32::MAX).min(16);
            let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
            let jitter_ms: u64 = rng().random_range(0..=250);
            let delay = delay + Duration::from_millis(jitter_ms);

            warn!(
                attempt,
                max = self.max_retries,
                elapsed_ms_total = total_dt.as_millis() as u64,
                ?delay,
                error = %e,
                "upsert attempt failed; backing off"
            );
            sleep(delay).await;
        }
    }
}
