//! Flattening the region tree into report records.

use std::time::Duration;

use crate::node::{NodeId, RegionTree};
use crate::profiler::RegionProfiler;

/// One node of the tree, serialized for reporting.
///
/// Slices are produced depth-first with siblings ordered by total
/// time descending (ties keep insertion order), so a reporter can
/// print them top to bottom without touching the tree again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    /// Position in the flattened list; doubles as a unique id.
    pub id: usize,
    /// Region name.
    pub name: String,
    /// Id of the parent slice, `None` for the root.
    pub parent: Option<usize>,
    /// Depth in the hierarchy, 0 for the root.
    pub call_depth: usize,
    /// Number of recorded samples.
    pub count: u64,
    /// Total time spent in the region.
    pub total: Duration,
    /// Total time minus the totals of all direct children, clamped
    /// at zero.
    pub total_inner: Duration,
    /// Shortest sample.
    pub min: Duration,
    /// Longest sample.
    pub max: Duration,
}

impl Slice {
    /// Average sample duration, zero when there are no samples.
    pub fn avg(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            let nanos = self.total.as_nanos() / u128::from(self.count);
            Duration::from_nanos(nanos as u64)
        }
    }

    /// Name of the parent slice, empty for the root.
    pub fn parent_name<'a>(&self, slices: &'a [Slice]) -> &'a str {
        match self.parent {
            Some(id) => &slices[id].name,
            None => "",
        }
    }
}

/// Serialize a whole tree into slices, starting at the root.
pub fn flatten(tree: &RegionTree) -> Vec<Slice> {
    let mut slices = Vec::with_capacity(tree.len());
    flatten_node(tree, tree.root(), None, 0, &mut slices);
    slices
}

/// Slices for the current state of a profiler.
pub fn flatten_profiler(profiler: &RegionProfiler) -> Vec<Slice> {
    profiler.with_tree(flatten)
}

fn flatten_node(
    tree: &RegionTree,
    id: NodeId,
    parent: Option<usize>,
    call_depth: usize,
    slices: &mut Vec<Slice>,
) {
    let stats = tree.stats(id);
    let slice_id = slices.len();
    slices.push(Slice {
        id: slice_id,
        name: tree.node(id).name().to_string(),
        parent,
        call_depth,
        count: stats.count,
        total: stats.total,
        total_inner: Duration::ZERO,
        min: stats.min,
        max: stats.max,
    });

    let mut children: Vec<NodeId> = tree.node(id).children().collect();
    // Stable sort keeps insertion order among equal totals.
    children.sort_by(|a, b| tree.total_time(*b).cmp(&tree.total_time(*a)));

    let mut child_total = Duration::ZERO;
    for child in children {
        child_total += tree.total_time(child);
        flatten_node(tree, child, Some(slice_id), call_depth + 1, slices);
    }
    slices[slice_id].total_inner = stats.total.saturating_sub(child_total);
}

/// Human-readable duration: `10.04 s`, `132.4 ms`, `1.324 us`,
/// `132 ns`.
pub fn format_duration(duration: Duration) -> String {
    let mut value = duration.as_secs_f64();
    for unit in ["s", "ms", "us"] {
        if value >= 500.0 {
            return format!("{value:.0} {unit}");
        }
        if value >= 100.0 {
            return format!("{value:.1} {unit}");
        }
        if value >= 10.0 {
            return format!("{value:.2} {unit}");
        }
        if value >= 1.0 {
            return format!("{value:.3} {unit}");
        }
        value *= 1000.0;
    }
    format!("{} ns", duration.as_nanos())
}
