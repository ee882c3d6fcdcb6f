//! Pacing between follow-up page requests.
//!
//! The search API only guarantees a pagination cursor is usable after a short
//! propagation window, so the fetcher acquires a permit before every
//! follow-up page. The first request of a region is never delayed.

use std::time::Duration;

/// Delay applied between pages unless configured otherwise.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(3);

/// Block until the next request is permitted.
pub trait RateLimiter {
    /// Wait for permission to issue one request.
    fn acquire(&self);
}

impl<T: RateLimiter + ?Sized> RateLimiter for &T {
    fn acquire(&self) {
        (**self).acquire();
    }
}

impl<T: RateLimiter + ?Sized> RateLimiter for Box<T> {
    fn acquire(&self) {
        (**self).acquire();
    }
}

/// Sleep the calling thread for a fixed duration on every acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    /// Construct a limiter sleeping for `delay`.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Configured delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_DELAY)
    }
}

impl RateLimiter for FixedDelay {
    fn acquire(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unthrottled;

impl RateLimiter for Unthrottled {
    fn acquire(&self) {}
}
