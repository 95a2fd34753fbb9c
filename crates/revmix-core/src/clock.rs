//! Wall-clock sources for audio streams.
//!
//! The mixer compares its render cursor against "now" to detect overruns, so
//! the clock is injected instead of read from a global. [`SystemClock`] is the
//! real thing; [`ManualClock`] lets tests and offline renders step time by hand.

use crate::lockfree::AtomicDouble;
use std::time::Instant;

/// Monotonic time source in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Monotonic clock counting seconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to.
///
/// # Example
///
/// ```
/// use revmix_core::{Clock, ManualClock};
///
/// let clock = ManualClock::new(0.0);
/// clock.advance(0.5);
/// assert_eq!(clock.now(), 0.5);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    time: AtomicDouble,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            time: AtomicDouble::new(start),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.time.set(seconds);
    }

    pub fn advance(&self, seconds: f64) {
        self.time.fetch_add(seconds);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> f64 {
        self.time.get()
    }
}
