//! Observer hooks for region events.

use tracing::debug;

use crate::node::{NodeId, RegionTree};

/// Observer of profiler events.
///
/// Hooks run synchronously on the enter/exit/cancel/finalize path, so
/// a slow listener directly adds latency to every timed region. Hooks
/// are invoked from guaranteed-cleanup paths and must not panic;
/// implementations should report their own failures (for example via
/// `tracing::error!`) instead of unwinding.
pub trait RegionListener {
    /// A region was entered and is now the stack top.
    fn on_enter(&mut self, tree: &RegionTree, node: NodeId) {
        let _ = (tree, node);
    }

    /// A region was exited; for non-cancelled outermost exits a
    /// sample was just recorded.
    fn on_exit(&mut self, tree: &RegionTree, node: NodeId) {
        let _ = (tree, node);
    }

    /// A region's in-flight measurement was discarded.
    fn on_cancel(&mut self, tree: &RegionTree, node: NodeId) {
        let _ = (tree, node);
    }

    /// The profiler session ended.
    fn on_finalize(&mut self) {}
}

/// Listener that logs every event through `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogListener;

impl LogListener {
    /// Create a log listener.
    pub fn new() -> Self {
        Self
    }
}

impl RegionListener for LogListener {
    fn on_enter(&mut self, tree: &RegionTree, node: NodeId) {
        let node = tree.node(node);
        debug!(
            region = node.name(),
            begin = ?node.timer().begin_ts(),
            depth = node.recursion_depth(),
            "entered region"
        );
    }

    fn on_exit(&mut self, tree: &RegionTree, node: NodeId) {
        let node = tree.node(node);
        debug!(
            region = node.name(),
            elapsed = ?node.timer().elapsed(),
            "exited region"
        );
    }

    fn on_cancel(&mut self, tree: &RegionTree, node: NodeId) {
        debug!(region = tree.node(node).name(), "cancelled region");
    }

    fn on_finalize(&mut self) {
        debug!("finalizing profiler");
    }
}
