//! JSON reporter.

use std::io::Write;

use serde::Serialize;

use crate::error::ProfilerError;
use crate::output::Reporter;
use crate::profiler::RegionProfiler;
use crate::report::{self, Slice};

/// Serializes the flattened slice list as a JSON array.
///
/// Durations are reported in integer microseconds, matching the CSV
/// reporter's columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReporter {
    pretty: bool,
}

#[derive(Serialize)]
struct JsonSlice<'a> {
    id: usize,
    name: &'a str,
    parent_id: Option<usize>,
    call_depth: usize,
    count: u64,
    total_us: u128,
    total_inner_us: u128,
    min_us: u128,
    average_us: u128,
    max_us: u128,
}

impl<'a> JsonSlice<'a> {
    fn from_slice(slice: &'a Slice) -> Self {
        Self {
            id: slice.id,
            name: &slice.name,
            parent_id: slice.parent,
            call_depth: slice.call_depth,
            count: slice.count,
            total_us: slice.total.as_micros(),
            total_inner_us: slice.total_inner.as_micros(),
            min_us: slice.min.as_micros(),
            average_us: slice.avg().as_micros(),
            max_us: slice.max.as_micros(),
        }
    }
}

impl JsonReporter {
    /// Compact single-line output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-printed output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Reporter for JsonReporter {
    fn write_report(
        &self,
        profiler: &RegionProfiler,
        out: &mut dyn Write,
    ) -> Result<(), ProfilerError> {
        let slices = report::flatten_profiler(profiler);
        let records: Vec<JsonSlice<'_>> = slices.iter().map(JsonSlice::from_slice).collect();
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, &records)?;
        } else {
            serde_json::to_writer(&mut *out, &records)?;
        }
        writeln!(out)?;
        Ok(())
    }
}
