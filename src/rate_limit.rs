//! Rolling-window rate limiting for E-utilities calls
//!
//! NCBI blocks clients that exceed their request ceilings, so every gated
//! operation waits here until issuing one more call keeps the trailing
//! window within its limit. Callers are delayed, never rejected.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument};

/// Calls per second allowed for search requests
pub const SEARCH_CALLS_PER_SECOND: usize = 2;

/// Calls per second allowed for detail retrieval
pub const RETRIEVAL_CALLS_PER_SECOND: usize = 5;

/// Rate limiter admitting at most `calls` acquisitions in any trailing `period`
///
/// Clones share the same window, so one limiter instance can gate any number
/// of tasks.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    window: Arc<Mutex<CallWindow>>,
    max_calls: usize,
    period: Duration,
}

#[derive(Debug)]
struct CallWindow {
    max_calls: usize,
    period: Duration,
    admitted: VecDeque<Instant>,
}

impl RateLimiter {
    /// Create a limiter allowing `calls` acquisitions per `period`
    ///
    /// A ceiling of zero would never admit anything and is raised to one.
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_scraper::rate_limit::RateLimiter;
    /// use std::time::Duration;
    ///
    /// let limiter = RateLimiter::new(3, Duration::from_secs(1));
    /// assert_eq!(limiter.max_calls(), 3);
    /// ```
    pub fn new(calls: usize, period: Duration) -> Self {
        let max_calls = calls.max(1);
        Self {
            window: Arc::new(Mutex::new(CallWindow {
                max_calls,
                period,
                admitted: VecDeque::new(),
            })),
            max_calls,
            period,
        }
    }

    /// Limiter for ESearch calls (2 per second)
    pub fn search() -> Self {
        Self::new(SEARCH_CALLS_PER_SECOND, Duration::from_secs(1))
    }

    /// Limiter for detail retrieval calls (5 per second)
    pub fn retrieval() -> Self {
        Self::new(RETRIEVAL_CALLS_PER_SECOND, Duration::from_secs(1))
    }

    /// Wait until one more call fits in the trailing window, then claim it
    ///
    /// The window lock is held while sleeping, so concurrent callers are
    /// admitted one at a time in arrival order.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pubmed_scraper::rate_limit::RateLimiter;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let limiter = RateLimiter::search();
    ///
    ///     limiter.acquire().await;
    ///     // first call
    ///     limiter.acquire().await;
    ///     // second call
    ///     limiter.acquire().await;
    ///     // third call, roughly one second after the first
    /// }
    /// ```
    #[instrument(skip(self), fields(max_calls = self.max_calls))]
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            window.evict_expired(now);

            match window.wait_time(now) {
                None => {
                    window.admitted.push_back(now);
                    debug!(in_window = window.admitted.len(), "Call admitted");
                    return;
                }
                Some(wait) => {
                    debug!(wait_ms = wait.as_millis() as u64, "Window full, waiting");
                    sleep(wait).await;
                }
            }
        }
    }

    /// Number of admissions still inside the trailing window
    pub async fn calls_in_window(&self) -> usize {
        let mut window = self.window.lock().await;
        window.evict_expired(Instant::now());
        window.admitted.len()
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl CallWindow {
    fn evict_expired(&mut self, now: Instant) {
        while let Some(&oldest) = self.admitted.front() {
            if now.duration_since(oldest) >= self.period {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }

    /// How long until the oldest admission leaves the window, if it is full
    fn wait_time(&self, now: Instant) -> Option<Duration> {
        if self.admitted.len() < self.max_calls {
            return None;
        }
        let oldest = *self.admitted.front()?;
        Some((oldest + self.period).saturating_duration_since(now))
    }
}
