//! Monotonic clock sources.
//!
//! Timers never read wall-clock time directly; they go through the
//! [`Clock`] trait so that tests (and exotic setups such as counting
//! allocated bytes instead of nanoseconds) can substitute their own
//! time source. All clocks report a [`Duration`] since some fixed,
//! clock-private origin and must be monotonic.
//!
//! ## Measuring something other than time
//!
//! Nothing ties the seam to nanoseconds. A clock reading resident set
//! size turns every region report into a memory profile, with bytes
//! carried on the `Duration` scale:
//!
//! ```no_run
//! use std::time::Duration;
//! use region_profiler::Clock;
//!
//! struct RssClock;
//!
//! impl Clock for RssClock {
//!     fn now(&self) -> Duration {
//!         // Second field of /proc/self/statm: resident pages.
//!         let statm = std::fs::read_to_string("/proc/self/statm").unwrap_or_default();
//!         let pages: u64 = statm
//!             .split_whitespace()
//!             .nth(1)
//!             .and_then(|field| field.parse().ok())
//!             .unwrap_or(0);
//!         Duration::from_nanos(pages * 4096)
//!     }
//! }
//! ```
//!
//! Readings that go backwards (memory can shrink) clamp the affected
//! leg to zero instead of corrupting the accumulated totals, since
//! all timer subtraction saturates.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A monotonic time source.
///
/// Implementations report the time elapsed since an arbitrary but
/// fixed origin. Successive calls to [`Clock::now`] must never go
/// backwards.
pub trait Clock {
    /// Current reading of the clock.
    fn now(&self) -> Duration;
}

/// The default clock, backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock anchored at the moment of construction.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.
///
/// Cloning a `ManualClock` yields a handle to the same underlying
/// reading, so a test can keep one handle for advancing time while
/// the profiler holds another:
///
/// ```
/// use std::rc::Rc;
/// use std::time::Duration;
/// use region_profiler::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let handle: Rc<dyn Clock> = Rc::new(clock.clone());
/// clock.advance(Duration::from_millis(5));
/// assert_eq!(handle.now(), Duration::from_millis(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    reading: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Create a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock with an initial reading.
    pub fn starting_at(reading: Duration) -> Self {
        Self {
            reading: Rc::new(Cell::new(reading)),
        }
    }

    /// Move the clock forward by `step`.
    pub fn advance(&self, step: Duration) {
        self.reading.set(self.reading.get() + step);
    }

    /// Set the clock to an absolute reading.
    ///
    /// The new reading must not be earlier than the current one;
    /// monotonicity is part of the [`Clock`] contract.
    pub fn set(&self, reading: Duration) {
        debug_assert!(reading >= self.reading.get());
        self.reading.set(reading);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Duration {
        self.reading.get()
    }
}

/// Shared handle to the default clock.
pub fn default_clock() -> Rc<dyn Clock> {
    Rc::new(MonotonicClock::new())
}
