//! Minimum spacing between reverse-geocoding requests

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Nominatim's usage policy allows at most one request per second
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1100);

/// Time source used by the throttle
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Blocks callers so that successive requests are at least `interval` apart
pub struct Throttle {
    interval: Duration,
    last_request: Option<Instant>,
    clock: Arc<dyn Clock>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, Arc::new(SystemClock))
    }

    pub fn with_clock(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            last_request: None,
            clock,
        }
    }

    /// Wait until the interval since the previous request has elapsed,
    /// then record the current time as the new request time
    pub fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < self.interval {
                let remaining = self.interval - elapsed;
                trace!(?remaining, "Throttling reverse geocoding request");
                self.clock.sleep(remaining);
            }
        }
        self.last_request = Some(self.clock.now());
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(MIN_REQUEST_INTERVAL)
    }
}
