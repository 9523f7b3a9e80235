//! Leg-based duration measurement over an injected clock.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::clock::Clock;

/// Measures elapsed time across one or more start/stop "legs".
///
/// A leg runs from a [`start`](Timer::start) to the next
/// [`stop`](Timer::stop). Completed legs accumulate into a running
/// total, which lets the same timer measure sequential visits to a
/// region as well as the root node's continuous session (stopped for
/// an intermediate reading and resumed later).
///
/// Recursive re-entrance into a running region must not reset the
/// outer leg, so nested entries record an
/// [auxiliary event](Timer::mark_aux_event) instead of calling
/// `start` again.
pub struct Timer {
    clock: Rc<dyn Clock>,
    begin: Duration,
    end: Duration,
    total: Duration,
    running: bool,
    last_event: Duration,
}

impl Timer {
    /// Create a stopped timer reading the given clock.
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            begin: Duration::ZERO,
            end: Duration::ZERO,
            total: Duration::ZERO,
            running: false,
            last_event: Duration::ZERO,
        }
    }

    /// Begin a new measurement leg.
    pub fn start(&mut self) {
        self.begin = self.clock.now();
        self.last_event = self.begin;
        self.running = true;
    }

    /// Finish the current leg and add its duration to the total.
    ///
    /// No-op when the timer is not running.
    pub fn stop(&mut self) {
        if self.running {
            self.end = self.clock.now();
            self.last_event = self.end;
            self.total += self.end.saturating_sub(self.begin);
            self.running = false;
        }
    }

    /// Record a timestamp without touching leg state.
    ///
    /// Used on recursive re-entrance, where restarting the leg would
    /// corrupt the outer measurement. Listeners may consume the mark
    /// for event ordering.
    pub fn mark_aux_event(&mut self) {
        self.last_event = self.clock.now();
    }

    /// Whether a leg is currently open.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Timestamp of the current (or last) leg's start event.
    pub fn begin_ts(&self) -> Duration {
        self.begin
    }

    /// Timestamp of the last leg's stop event.
    pub fn end_ts(&self) -> Duration {
        self.end
    }

    /// Timestamp of the most recent start/stop/auxiliary event.
    pub fn last_event_ts(&self) -> Duration {
        self.last_event
    }

    /// Duration of the most recently completed leg, or of the
    /// in-progress leg while running. Zero if never started.
    pub fn elapsed(&self) -> Duration {
        if self.running {
            self.clock.now().saturating_sub(self.begin)
        } else {
            self.end.saturating_sub(self.begin)
        }
    }

    /// Duration of the in-progress leg, or zero when stopped.
    pub fn current_elapsed(&self) -> Duration {
        if self.running {
            self.clock.now().saturating_sub(self.begin)
        } else {
            Duration::ZERO
        }
    }

    /// Sum of all completed legs, plus the in-progress leg if running.
    pub fn total_elapsed(&self) -> Duration {
        self.total + self.current_elapsed()
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("begin", &self.begin)
            .field("end", &self.end)
            .field("total", &self.total)
            .field("running", &self.running)
            .finish()
    }
}
