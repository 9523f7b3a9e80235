//! Chrome Trace Viewer export.
//!
//! Streams region enter/exit events into the JSON array format
//! understood by `chrome://tracing` and compatible viewers such as
//! Perfetto.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};

use crate::error::ProfilerError;
use crate::listener::RegionListener;
use crate::node::{NodeId, RegionTree};

// One profiler models one thread of execution.
const TRACE_TID: u32 = 0;

#[derive(Serialize)]
struct DurationEvent<'a> {
    name: &'a str,
    ph: &'a str,
    ts: u128,
    pid: u32,
    tid: u32,
}

#[derive(Serialize)]
struct MetadataEvent<'a> {
    name: &'a str,
    ph: &'a str,
    pid: u32,
    tid: u32,
    args: MetadataArgs<'a>,
}

#[derive(Serialize)]
struct MetadataArgs<'a> {
    name: &'a str,
}

/// Listener writing a Chrome Trace file.
///
/// Begin events are buffered until the next event arrives, so a
/// cancelled probe (the iterator proxy discovering the end of its
/// sequence) produces no begin/end pair in the trace at all.
///
/// Write failures after construction are logged through `tracing` and
/// otherwise swallowed: a broken trace file must not disturb the
/// profiler's stack bookkeeping.
pub struct ChromeTraceListener {
    path: PathBuf,
    out: BufWriter<File>,
    pending_begin: Option<NodeId>,
    last_cancelled: Option<NodeId>,
}

impl ChromeTraceListener {
    /// Create the trace file and write its preamble.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ProfilerError> {
        let path = path.into();
        let mut listener = File::create(&path)
            .map(|file| Self {
                out: BufWriter::new(file),
                path: path.clone(),
                pending_begin: None,
                last_cancelled: None,
            })
            .map_err(|source| ProfilerError::Trace {
                path: path.clone(),
                source,
            })?;
        listener
            .write_preamble()
            .map_err(|source| ProfilerError::Trace { path, source })?;
        Ok(listener)
    }

    /// Location of the trace file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_preamble(&mut self) -> std::io::Result<()> {
        let pid = std::process::id();
        self.out.write_all(b"[")?;
        let process_name = std::env::args().next().unwrap_or_default();
        serde_json::to_writer(
            &mut self.out,
            &MetadataEvent {
                name: "process_name",
                ph: "M",
                pid,
                tid: TRACE_TID,
                args: MetadataArgs {
                    name: basename(&process_name),
                },
            },
        )?;
        self.out.write_all(b",\n")?;
        serde_json::to_writer(
            &mut self.out,
            &MetadataEvent {
                name: "thread_name",
                ph: "M",
                pid,
                tid: TRACE_TID,
                args: MetadataArgs { name: "Main" },
            },
        )?;
        Ok(())
    }

    fn write_event(&mut self, name: &str, ph: &str, ts_micros: u128) {
        let event = DurationEvent {
            name,
            ph,
            ts: ts_micros,
            pid: std::process::id(),
            tid: TRACE_TID,
        };
        let result = self
            .out
            .write_all(b",\n")
            .and_then(|()| serde_json::to_writer(&mut self.out, &event).map_err(Into::into));
        if let Err(error) = result {
            error!(path = %self.path.display(), %error, "failed to write trace event");
        }
    }

    fn write_begin(&mut self, tree: &RegionTree, node: NodeId) {
        let region = tree.node(node);
        let ts = region.timer().begin_ts().as_micros();
        self.write_event(region.name(), "B", ts);
    }

    fn write_end(&mut self, tree: &RegionTree, node: NodeId) {
        let region = tree.node(node);
        let ts = region.timer().end_ts().as_micros();
        self.write_event(region.name(), "E", ts);
    }
}

impl RegionListener for ChromeTraceListener {
    fn on_enter(&mut self, tree: &RegionTree, node: NodeId) {
        if let Some(pending) = self.pending_begin {
            self.write_begin(tree, pending);
        }
        self.pending_begin = Some(node);
        self.last_cancelled = None;
    }

    fn on_exit(&mut self, tree: &RegionTree, node: NodeId) {
        if let Some(pending) = self.pending_begin {
            // A cancelled probe exits without having produced any
            // nested events; drop its begin instead of emitting an
            // empty pair.
            if pending == node && self.last_cancelled == Some(node) {
                self.last_cancelled = None;
                self.pending_begin = None;
                return;
            }
            self.last_cancelled = None;
            self.write_begin(tree, pending);
            self.pending_begin = None;
        }
        self.write_end(tree, node);
    }

    fn on_cancel(&mut self, _tree: &RegionTree, node: NodeId) {
        self.last_cancelled = Some(node);
    }

    fn on_finalize(&mut self) {
        let result = self
            .out
            .write_all(b"]")
            .and_then(|()| self.out.flush());
        match result {
            Ok(()) => info!(path = %self.path.display(), "chrome trace saved"),
            Err(error) => {
                error!(path = %self.path.display(), %error, "failed to finish trace file");
            }
        }
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
