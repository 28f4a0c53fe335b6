//! Bounded waiting for client-side rendering to settle.
//!
//! The league site fills its pages in from JavaScript with no signal when it
//! is done. Instead of sleeping a fixed time, the scrapers poll an element
//! count until it stops changing, with an upper bound on the number of polls.

use crate::error::RenderError;
use crate::render::RenderContext;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Polling policy: at most `max_attempts` samples, `poll_interval` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityWait {
    /// Upper bound on samples taken; zero is treated as one.
    pub max_attempts: u32,
    /// Pause between two samples.
    pub poll_interval: Duration,
}

impl Default for StabilityWait {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Two consecutive non-zero samples agreed.
    Stable(usize),
    /// Attempts ran out; holds the last sample.
    TimedOut(usize),
}

#[cfg(test)]
impl WaitOutcome {
    fn count(self) -> usize {
        match self {
            WaitOutcome::Stable(n) | WaitOutcome::TimedOut(n) => n,
        }
    }
}

impl StabilityWait {
    /// Sample until two consecutive samples return the same non-zero value.
    ///
    /// # Arguments
    ///
    /// * `sample` - Async closure returning the current element count.
    ///
    /// # Returns
    ///
    /// The settled count, or the last count seen when attempts run out. An
    /// error from `sample` ends the wait and is returned as is.
    ///
    /// An empty result is never taken as settled: a page that has not started
    /// rendering yet looks the same as one with nothing to show, so zero keeps
    /// polling until attempts run out.
    pub async fn until_stable<F, Fut, E>(&self, mut sample: F) -> Result<WaitOutcome, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<usize, E>>,
    {
        let mut previous: Option<usize> = None;
        let mut last = 0;
        for attempt in 1..=self.max_attempts.max(1) {
            last = sample().await?;
            if previous == Some(last) && last > 0 {
                debug!(attempt, count = last, "Render settled");
                return Ok(WaitOutcome::Stable(last));
            }
            previous = Some(last);
            if attempt < self.max_attempts {
                sleep(self.poll_interval).await;
            }
        }
        warn!(
            attempts = self.max_attempts,
            count = last,
            "Render did not settle; continuing with what is present"
        );
        Ok(WaitOutcome::TimedOut(last))
    }

    /// Wait for the number of elements matching `selector` to settle.
    pub async fn for_selector<R: RenderContext>(
        &self,
        ctx: &R,
        selector: &str,
    ) -> Result<WaitOutcome, RenderError> {
        self.until_stable(|| async move { Ok::<_, RenderError>(ctx.query_all(selector).await?.len()) })
            .await
    }
}
