//! Report rendering and trace export.
//!
//! Everything here consumes the flattened [`Slice`](crate::report::Slice)
//! list (or, for the Chrome Trace listener, the live event stream) and
//! contains no timing logic of its own.

mod chrome_trace;
mod console;
mod csv;
mod json;

use std::io::Write;

use crate::error::ProfilerError;
use crate::profiler::RegionProfiler;

pub use chrome_trace::ChromeTraceListener;
pub use console::ConsoleReporter;
pub use csv::CsvReporter;
pub use json::JsonReporter;

/// Renders a profiler's current state to a sink.
pub trait Reporter {
    /// Write the report.
    fn write_report(
        &self,
        profiler: &RegionProfiler,
        out: &mut dyn Write,
    ) -> Result<(), ProfilerError>;

    /// Write the report to stderr, logging instead of failing on
    /// I/O errors.
    fn print(&self, profiler: &RegionProfiler) {
        let stderr = std::io::stderr();
        if let Err(error) = self.write_report(profiler, &mut stderr.lock()) {
            tracing::error!(%error, "failed to print report");
        }
    }
}
