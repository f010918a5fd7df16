//! Injectable time sources.
//!
//! The phase clock never reads the wall clock directly. Production code uses
//! [`MonotonicTimeSource`]; tests use [`ManualTimeSource`] to simulate
//! suspensions and throttled ticks without sleeping.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of "now" for deadline arithmetic.
pub trait TimeSource: Send + Sync {
    /// Returns the current monotonic instant.
    fn now(&self) -> Instant;
}

/// Monotonic time as seen by the tokio runtime.
///
/// Outside a paused test runtime this is `Instant::now()`; under
/// `tokio::time::pause` it follows the runtime's virtual clock, so interval
/// firings and deadline reads stay consistent.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicTimeSource;

impl TimeSource for MonotonicTimeSource {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Manually advanced time source for tests.
#[derive(Debug)]
pub struct ManualTimeSource {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualTimeSource {
    /// Creates a time source frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Moves time forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    /// Moves time forward by a number of milliseconds.
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Total time advanced since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}
