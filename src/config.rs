//! Profiler construction options.

use std::rc::Rc;

use crate::clock::{default_clock, Clock};
use crate::listener::RegionListener;

/// Options recognized at profiler construction.
///
/// ```
/// use region_profiler::{LogListener, ProfilerConfig, RegionProfiler};
///
/// let profiler = RegionProfiler::with_config(
///     ProfilerConfig::new().with_listener(LogListener::new()),
/// );
/// # profiler.finalize();
/// ```
pub struct ProfilerConfig {
    /// Clock shared by every timer the tree creates.
    pub clock: Rc<dyn Clock>,
    /// Listeners notified of region events, in registration order.
    pub listeners: Vec<Box<dyn RegionListener>>,
}

impl ProfilerConfig {
    /// Default clock, no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the clock used for all timers.
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Append a listener.
    pub fn with_listener(mut self, listener: impl RegionListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            clock: default_clock(),
            listeners: Vec::new(),
        }
    }
}
