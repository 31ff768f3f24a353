//! Per-endpoint request throttle.
//!
//! Enforces a minimum interval between the starts of two calls sharing the
//! same endpoint key. Calls to different keys never wait on each other.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// Throttle keyed by logical endpoint name.
///
/// Each panel owns its own instance, so throttle state is never shared
/// between panels.
#[derive(Debug)]
pub struct RequestThrottle {
    /// Minimum duration between dispatches to the same endpoint.
    min_interval: Duration,

    /// Dispatch time of the most recent (or reserved) call per endpoint.
    last_dispatch: Mutex<HashMap<String, Instant>>,
}

impl RequestThrottle {
    /// Creates a throttle with the specified minimum interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a throttle from milliseconds.
    #[must_use]
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Runs `op` once the endpoint's spacing allows it.
    ///
    /// The result of `op` is returned unchanged, failures included.
    pub async fn run<F, Fut, T>(&self, endpoint: &str, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire(endpoint).await;
        op().await
    }

    /// Reserves the next dispatch slot for `endpoint` and waits for it.
    ///
    /// The slot is recorded before waiting, so overlapping callers line up
    /// one interval apart. Returns the duration waited.
    pub async fn acquire(&self, endpoint: &str) -> Duration {
        let wait_duration = {
            let mut last = self.last_dispatch.lock().await;
            let now = Instant::now();
            let dispatch_at = last
                .get(endpoint)
                .map_or(now, |&prev| (prev + self.min_interval).max(now));
            last.insert(endpoint.to_owned(), dispatch_at);
            dispatch_at.saturating_duration_since(now)
        };

        if !wait_duration.is_zero() {
            debug!(
                "Throttle: waiting {:?} before calling {}",
                wait_duration, endpoint
            );
            tokio::time::sleep(wait_duration).await;
        }

        wait_duration
    }
}
