//! The region tree: per-name nodes aggregating timing statistics.
//!
//! Nodes live in an arena owned by [`RegionTree`] and are addressed
//! by [`NodeId`]. The root (always id 0) represents the whole
//! profiling session and has special semantics: its timer runs from
//! tree construction, its statistics are a live view of the running
//! total, and it cannot be cancelled.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use tracing::warn;

use crate::clock::Clock;
use crate::stats::SeqStats;
use crate::timer::Timer;

/// Name of the root node in reports.
pub const ROOT_NODE_NAME: &str = "<main>";

/// Handle to a node inside a [`RegionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in the tree's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Root,
    Region,
}

/// A named region accumulating statistics over all its visits.
///
/// A node is created lazily the first time its parent is asked for a
/// child of that name, and persists for the whole session so repeated
/// visits aggregate. `recursion_depth` counts currently-unmatched
/// enters; only the outermost exit (depth 1 -> 0) closes the timing
/// leg and records a sample.
pub struct RegionNode {
    name: String,
    timer: Timer,
    stats: SeqStats,
    recursion_depth: u32,
    cancelled: bool,
    kind: NodeKind,
    clock: Rc<dyn Clock>,
    children: HashMap<String, NodeId>,
    child_order: Vec<NodeId>,
}

impl RegionNode {
    fn new(name: String, kind: NodeKind, clock: Rc<dyn Clock>) -> Self {
        Self {
            name,
            timer: Timer::new(Rc::clone(&clock)),
            stats: SeqStats::new(),
            recursion_depth: 0,
            cancelled: false,
            kind,
            clock,
            children: HashMap::new(),
            child_order: Vec::new(),
        }
    }

    /// Region name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recorded statistics.
    ///
    /// For the root node prefer [`RegionTree::stats`], which returns
    /// the live session view instead of this (always empty) record.
    pub fn recorded_stats(&self) -> SeqStats {
        self.stats
    }

    /// The node's timer, for listeners reading event timestamps.
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Number of currently-unmatched enter events.
    pub fn recursion_depth(&self) -> u32 {
        self.recursion_depth
    }

    /// Whether the node is currently entered.
    pub fn is_active(&self) -> bool {
        self.recursion_depth > 0
    }

    /// Child ids in insertion order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.child_order.iter().copied()
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.child_order.len()
    }

    fn enter_region(&mut self) {
        if self.kind == NodeKind::Root {
            // Depth bookkeeping is frozen at 1 for the root; entering
            // after an intermediate stop resumes the session leg.
            if !self.timer.is_running() {
                self.timer.start();
            } else {
                self.timer.mark_aux_event();
            }
            return;
        }
        if self.recursion_depth == 0 {
            self.timer.start();
        } else {
            self.timer.mark_aux_event();
        }
        self.cancelled = false;
        self.recursion_depth += 1;
    }

    fn exit_region(&mut self) {
        if self.kind == NodeKind::Root {
            // Intermediate reading; a later enter resumes the session.
            self.timer.stop();
            return;
        }
        if self.cancelled {
            // The pairing exit of an already-cancelled probe.
            self.cancelled = false;
            self.timer.mark_aux_event();
            return;
        }
        debug_assert!(self.recursion_depth > 0, "unmatched exit_region");
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
        if self.recursion_depth == 0 {
            self.timer.stop();
            self.stats.add(self.timer.elapsed());
        } else {
            self.timer.mark_aux_event();
        }
    }

    fn cancel_region(&mut self) {
        if self.kind == NodeKind::Root {
            warn!("attempted to cancel the root region; ignoring");
            return;
        }
        debug_assert!(self.recursion_depth > 0, "unmatched cancel_region");
        self.cancelled = true;
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
        if self.recursion_depth == 0 {
            self.timer.stop();
        } else {
            self.timer.mark_aux_event();
        }
    }
}

/// Arena of [`RegionNode`]s rooted at [`NodeId::ROOT`].
///
/// The tree only grows: nodes are appended on first visit and never
/// removed, so `NodeId`s stay valid for the tree's lifetime.
pub struct RegionTree {
    nodes: Vec<RegionNode>,
}

impl RegionTree {
    /// Create a tree whose root timer starts immediately.
    ///
    /// New child nodes inherit their parent's clock unless one is
    /// supplied via [`get_child_with_clock`](Self::get_child_with_clock).
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        let mut root = RegionNode::new(ROOT_NODE_NAME.to_string(), NodeKind::Root, clock);
        root.timer.start();
        root.recursion_depth = 1;
        Self { nodes: vec![root] }
    }

    /// Root node id.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Read access to a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not come from this tree.
    pub fn node(&self, id: NodeId) -> &RegionNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut RegionNode {
        &mut self.nodes[id.0]
    }

    /// Number of nodes in the tree, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always contains at least the root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Return the child of `parent` named `name`, creating it on
    /// first request. Idempotent by name; O(1) amortized lookup.
    pub fn get_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let clock = self.nodes[parent.0].clock.clone();
        self.get_child_with_clock(parent, name, clock)
    }

    /// Like [`get_child`](Self::get_child) with an explicit clock for
    /// the new node. The override only applies on creation; an
    /// existing child keeps its clock.
    pub fn get_child_with_clock(
        &mut self,
        parent: NodeId,
        name: &str,
        clock: Rc<dyn Clock>,
    ) -> NodeId {
        if let Some(&child) = self.nodes[parent.0].children.get(name) {
            return child;
        }
        let child = NodeId(self.nodes.len());
        self.nodes
            .push(RegionNode::new(name.to_string(), NodeKind::Region, clock));
        let parent = self.node_mut(parent);
        parent.children.insert(name.to_string(), child);
        parent.child_order.push(child);
        child
    }

    /// Enter a region: start a fresh leg at depth 0, otherwise mark
    /// an auxiliary event. Clears any pending cancellation.
    pub fn enter_region(&mut self, id: NodeId) {
        self.node_mut(id).enter_region();
    }

    /// Exit a region. At the outermost level this closes the timing
    /// leg and records a sample; an exit directly following a
    /// cancellation only clears the cancelled flag.
    pub fn exit_region(&mut self, id: NodeId) {
        self.node_mut(id).exit_region();
    }

    /// Discard the in-flight measurement of a region.
    ///
    /// Statistics are left untouched. Cancelling the root is a
    /// recoverable misuse: a warning is emitted and nothing changes.
    pub fn cancel_region(&mut self, id: NodeId) {
        self.node_mut(id).cancel_region();
    }

    /// Statistics of a node.
    ///
    /// For regular nodes this is the record of completed samples. For
    /// the root it is a live view of the continuously-running session:
    /// count 1, with total/min/max all equal to the current total
    /// elapsed time.
    pub fn stats(&self, id: NodeId) -> SeqStats {
        let node = self.node(id);
        match node.kind {
            NodeKind::Root => {
                let elapsed = node.timer.total_elapsed();
                SeqStats::with_values(1, elapsed, elapsed, elapsed)
            }
            NodeKind::Region => node.stats,
        }
    }

    /// Total time of a node, as reported by [`stats`](Self::stats).
    pub fn total_time(&self, id: NodeId) -> Duration {
        self.stats(id).total
    }
}
