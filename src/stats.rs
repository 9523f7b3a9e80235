//! Online statistics over a sequence of duration samples.

use std::fmt;
use std::time::Duration;

/// Running min/max/sum/count of a duration sequence.
///
/// Samples are folded in one at a time; the sequence itself is never
/// stored. By convention the average of an empty sequence is zero,
/// not undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeqStats {
    /// Number of samples observed.
    pub count: u64,
    /// Sum of all samples.
    pub total: Duration,
    /// Smallest sample, or zero when empty.
    pub min: Duration,
    /// Largest sample, or zero when empty.
    pub max: Duration,
}

impl SeqStats {
    /// Empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics with explicit fields, mainly for test expectations.
    pub fn with_values(count: u64, total: Duration, min: Duration, max: Duration) -> Self {
        Self {
            count,
            total,
            min,
            max,
        }
    }

    /// Fold the next sample into the statistics. O(1).
    pub fn add(&mut self, sample: Duration) {
        self.count += 1;
        self.total += sample;
        if self.count == 1 {
            self.min = sample;
            self.max = sample;
        } else {
            self.min = self.min.min(sample);
            self.max = self.max.max(sample);
        }
    }

    /// Average sample, zero when no samples were recorded.
    pub fn avg(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            let nanos = self.total.as_nanos() / u128::from(self.count);
            Duration::from_nanos(nanos as u64)
        }
    }
}

impl fmt::Display for SeqStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SeqStats{{{:?}..{:?}..{:?}/{}}}",
            self.min,
            self.avg(),
            self.max,
            self.count
        )
    }
}
