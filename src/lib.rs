//! # region-profiler
//!
//! Instrument named regions of code and aggregate per-region timing
//! statistics into a call tree.
//!
//! A region is any span of execution the program marks explicitly: a
//! block, a function call, or a single loop iteration. Repeated
//! visits to the same name under the same parent merge into one node,
//! so a report shows aggregate count/total/min/average/max per region
//! rather than one line per visit. Recursion is handled (re-entering
//! an active region never corrupts its outer measurement), and the
//! iterator proxy's end-of-sequence probe is *cancelled* rather than
//! counted, so wrapping a loop's data source times exactly the
//! fetches that produced elements.
//!
//! ## Quick start
//!
//! ```
//! use region_profiler::{region, ConsoleReporter, RegionProfiler, Reporter};
//!
//! let profiler = RegionProfiler::new();
//!
//! {
//!     let _load = profiler.region("load");
//!     for batch in profiler.iterate(["a", "b", "c"], "fetch") {
//!         let _auto_named = region!(profiler); // "… <lib.rs:…>"
//!         let _ = batch;
//!     }
//! }
//!
//! profiler.finalize();
//! ConsoleReporter::new().print(&profiler);
//! ```
//!
//! A process-wide (per-thread) default instance lives in [`global`],
//! for call sites that should not thread a profiler reference around.
//!
//! ## Scope
//!
//! One `RegionProfiler` models one logical thread of control; the
//! node stack is unsynchronized by design. This is explicit-boundary
//! instrumentation, not a sampling profiler and not a tracer with
//! cross-thread correlation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod callsite;
pub mod clock;
pub mod config;
pub mod error;
pub mod global;
pub mod listener;
pub mod node;
pub mod output;
pub mod profiler;
pub mod report;
pub mod stats;
pub mod timer;

pub use callsite::CallSite;
pub use clock::{default_clock, Clock, ManualClock, MonotonicClock};
pub use config::ProfilerConfig;
pub use error::ProfilerError;
pub use listener::{LogListener, RegionListener};
pub use node::{NodeId, RegionNode, RegionTree, ROOT_NODE_NAME};
pub use output::{ChromeTraceListener, ConsoleReporter, CsvReporter, JsonReporter, Reporter};
pub use profiler::{ProfiledIter, RegionGuard, RegionProfiler};
pub use report::{flatten, format_duration, Slice};
pub use stats::SeqStats;
pub use timer::Timer;
