//! Human-readable table reporter.

use std::io::Write;

use colored::Colorize;

use crate::error::ProfilerError;
use crate::output::Reporter;
use crate::profiler::RegionProfiler;
use crate::report::{self, format_duration, Slice};

/// Prints the profiler state as an aligned table.
///
/// Nodes appear depth-first, siblings sorted by total time
/// descending, with the name column indented by nesting depth:
///
/// ```text
/// name                 total     % of total  count  min       average   max
/// -------------------  --------  ----------  -----  --------  --------  --------
/// <main>               925 ms       100.00%      1  925 ms    925 ms    925 ms
/// . bar()              494.5 ms      53.48%      1  494.5 ms  494.5 ms  494.5 ms
/// . . loop             408.1 ms      44.14%      1  408.1 ms  408.1 ms  408.1 ms
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter {
    color: bool,
}

const HEADERS: [&str; 7] = ["name", "total", "% of total", "count", "min", "average", "max"];

impl ConsoleReporter {
    /// Reporter with plain, uncolored output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable bold headers via ANSI escapes.
    pub fn with_color(mut self) -> Self {
        self.color = true;
        self
    }

    fn row(slice: &Slice, session_total: std::time::Duration) -> [String; 7] {
        let percent = if session_total.is_zero() {
            0.0
        } else {
            slice.total.as_secs_f64() * 100.0 / session_total.as_secs_f64()
        };
        [
            format!("{}{}", ". ".repeat(slice.call_depth), slice.name),
            format_duration(slice.total),
            format!("{percent:.2}%"),
            slice.count.to_string(),
            format_duration(slice.min),
            format_duration(slice.avg()),
            format_duration(slice.max),
        ]
    }
}

impl Reporter for ConsoleReporter {
    fn write_report(
        &self,
        profiler: &RegionProfiler,
        out: &mut dyn Write,
    ) -> Result<(), ProfilerError> {
        let slices = report::flatten_profiler(profiler);
        let session_total = slices[0].total;

        let rows: Vec<[String; 7]> = slices
            .iter()
            .map(|slice| Self::row(slice, session_total))
            .collect();

        let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.len());
            }
        }

        for (i, header) in HEADERS.iter().enumerate() {
            let cell = pad(header, widths[i], i == 0);
            let cell = if self.color {
                cell.bold().to_string()
            } else {
                cell
            };
            write_cell(out, &cell, i)?;
        }
        writeln!(out)?;
        for (i, width) in widths.iter().enumerate() {
            write_cell(out, &"-".repeat(*width), i)?;
        }
        writeln!(out)?;

        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                write_cell(out, &pad(cell, widths[i], i == 0), i)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn pad(cell: &str, width: usize, left_align: bool) -> String {
    if left_align {
        format!("{cell:<width$}")
    } else {
        format!("{cell:>width$}")
    }
}

fn write_cell(out: &mut dyn Write, cell: &str, index: usize) -> std::io::Result<()> {
    if index == 0 {
        write!(out, "{cell}")
    } else {
        write!(out, "  {cell}")
    }
}
