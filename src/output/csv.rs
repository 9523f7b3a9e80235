//! CSV reporter.

use std::io::Write;

use crate::error::ProfilerError;
use crate::output::Reporter;
use crate::profiler::RegionProfiler;
use crate::report;

/// Prints the profiler state as comma-separated rows.
///
/// Columns: `id, name, parent_id, parent_name, total_us,
/// total_inner_us, count, min_us, average_us, max_us`. Rows follow
/// the flattening order (depth-first, siblings by total descending).
///
/// ```text
/// id, name, parent_id, parent_name, total_us, total_inner_us, count, min_us, average_us, max_us
/// 0, <main>, , , 966221, 443352, 1, 966221, 966221, 966221
/// 1, bar(), 0, <main>, 522868, 68080, 1, 522868, 522868, 522868
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReporter;

impl CsvReporter {
    /// Create a CSV reporter.
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for CsvReporter {
    fn write_report(
        &self,
        profiler: &RegionProfiler,
        out: &mut dyn Write,
    ) -> Result<(), ProfilerError> {
        let slices = report::flatten_profiler(profiler);
        writeln!(
            out,
            "id, name, parent_id, parent_name, total_us, total_inner_us, \
             count, min_us, average_us, max_us"
        )?;
        for slice in &slices {
            let parent_id = slice
                .parent
                .map(|id| id.to_string())
                .unwrap_or_default();
            writeln!(
                out,
                "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
                slice.id,
                slice.name,
                parent_id,
                slice.parent_name(&slices),
                slice.total.as_micros(),
                slice.total_inner.as_micros(),
                slice.count,
                slice.min.as_micros(),
                slice.avg().as_micros(),
                slice.max.as_micros(),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::ProfilerConfig;
    use std::rc::Rc;
    use std::time::Duration;

    #[test]
    fn rows_carry_parent_links_and_microseconds() {
        let clock = ManualClock::new();
        let profiler = RegionProfiler::with_config(
            ProfilerConfig::new().with_clock(Rc::new(clock.clone())),
        );
        {
            let _outer = profiler.region("outer");
            clock.advance(Duration::from_millis(2));
            {
                let _inner = profiler.region("inner");
                clock.advance(Duration::from_millis(1));
            }
        }
        profiler.finalize();

        let mut buffer = Vec::new();
        CsvReporter::new()
            .write_report(&profiler, &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("id, name, parent_id"));
        assert_eq!(lines[1], "0, <main>, , , 3000, 0, 1, 3000, 3000, 3000");
        assert_eq!(
            lines[2],
            "1, outer, 0, <main>, 3000, 2000, 1, 3000, 3000, 3000"
        );
        assert_eq!(
            lines[3],
            "2, inner, 1, outer, 1000, 1000, 1, 1000, 1000, 1000"
        );
    }
}
