//! The profiler: call-stack navigation and event dispatch.
//!
//! [`RegionProfiler`] owns the region tree and the stack of
//! currently-open nodes. Regions are opened through RAII guards, so a
//! push is always paired with exactly one pop even when the
//! instrumented code panics; the stack can therefore never
//! desynchronize from the real call stack.
//!
//! A profiler models one logical thread of control. Instrumenting
//! concurrent tasks takes one profiler per task; the core provides no
//! synchronization.

use std::cell::RefCell;
use std::mem;

use tracing::warn;

use crate::config::ProfilerConfig;
use crate::listener::RegionListener;
use crate::node::{NodeId, RegionTree};

/// Region profiler for a single logical thread of execution.
///
/// ```
/// use region_profiler::RegionProfiler;
///
/// let profiler = RegionProfiler::new();
/// {
///     let _outer = profiler.region("load");
///     for chunk in profiler.iterate(0..3, "fetch") {
///         let _ = chunk;
///     }
/// }
/// profiler.finalize();
/// assert_eq!(profiler.with_tree(|tree| tree.len()), 3);
/// ```
pub struct RegionProfiler {
    inner: RefCell<ProfilerInner>,
    // Kept apart from `inner` so listeners can read the tree while
    // being notified.
    listeners: RefCell<Vec<Box<dyn RegionListener>>>,
}

struct ProfilerInner {
    tree: RegionTree,
    stack: Vec<NodeId>,
    finalized: bool,
}

impl RegionProfiler {
    /// Profiler with the default clock and no listeners.
    pub fn new() -> Self {
        Self::with_config(ProfilerConfig::new())
    }

    /// Profiler from an explicit configuration.
    ///
    /// The root region is entered immediately and listeners are
    /// notified of it in registration order.
    pub fn with_config(config: ProfilerConfig) -> Self {
        let tree = RegionTree::new(config.clock);
        let profiler = Self {
            inner: RefCell::new(ProfilerInner {
                tree,
                stack: vec![NodeId::ROOT],
                finalized: false,
            }),
            listeners: RefCell::new(config.listeners),
        };
        profiler.notify(|l, tree| l.on_enter(tree, NodeId::ROOT));
        profiler
    }

    /// Open a region named `name` under the current stack top.
    ///
    /// The returned guard closes the region when dropped, recording a
    /// timed sample on the node.
    pub fn region(&self, name: &str) -> RegionGuard<'_> {
        RegionGuard {
            profiler: self,
            node: self.open_region(false, name),
        }
    }

    /// Open a region directly under the root, regardless of nesting.
    ///
    /// Useful for merging statistics of a region reached through
    /// several different call paths.
    pub fn region_global(&self, name: &str) -> RegionGuard<'_> {
        RegionGuard {
            profiler: self,
            node: self.open_region(true, name),
        }
    }

    /// Wrap a function so each invocation runs inside a region named
    /// `"{name}()"`.
    ///
    /// The `()` suffix visually distinguishes function regions from
    /// block regions in reports. Functions taking several arguments
    /// are wrapped through a single tuple argument. Recursive calls
    /// re-enter the same node and record one sample per outermost
    /// invocation.
    pub fn wrap_fn<'p, F, A, R>(&'p self, name: &str, mut f: F) -> impl FnMut(A) -> R + 'p
    where
        F: FnMut(A) -> R + 'p,
    {
        let label = format!("{name}()");
        move |arg| {
            let _region = self.region(&label);
            f(arg)
        }
    }

    /// Like [`wrap_fn`](Self::wrap_fn), attaching the region to the
    /// root instead of the current nesting.
    pub fn wrap_fn_global<'p, F, A, R>(&'p self, name: &str, mut f: F) -> impl FnMut(A) -> R + 'p
    where
        F: FnMut(A) -> R + 'p,
    {
        let label = format!("{name}()");
        move |arg| {
            let _region = self.region_global(&label);
            f(arg)
        }
    }

    /// Time each "fetch next element" step of an iterable as its own
    /// sub-region of the current node.
    ///
    /// The child node is resolved once, up front, from the active
    /// parent. The produced iterator yields exactly the upstream
    /// values and is single-pass; the terminal probe that discovers
    /// the end of the sequence is cancelled rather than counted, so
    /// iterating N elements records exactly N samples. On a finalized
    /// profiler no node is created and values pass through untimed.
    pub fn iterate<'p, I>(&'p self, iterable: I, name: &str) -> ProfiledIter<'p, I::IntoIter>
    where
        I: IntoIterator,
    {
        self.make_iter(iterable, name, false)
    }

    /// Like [`iterate`](Self::iterate), attaching the fetch region to
    /// the root instead of the current nesting.
    pub fn iterate_global<'p, I>(&'p self, iterable: I, name: &str) -> ProfiledIter<'p, I::IntoIter>
    where
        I: IntoIterator,
    {
        self.make_iter(iterable, name, true)
    }

    fn make_iter<'p, I>(&'p self, iterable: I, name: &str, global: bool) -> ProfiledIter<'p, I::IntoIter>
    where
        I: IntoIterator,
    {
        ProfiledIter {
            profiler: self,
            inner: iterable.into_iter(),
            node: self.resolve_iter_node(global, name),
            done: false,
        }
    }

    /// Stop the session: close the root timer leg, notify listeners
    /// of the root exit, then call every listener's finalize hook in
    /// registration order. Idempotent; regions opened afterwards are
    /// inert.
    pub fn finalize(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.finalized {
                return;
            }
            inner.finalized = true;
            inner.tree.exit_region(NodeId::ROOT);
        }
        self.notify(|l, tree| l.on_exit(tree, NodeId::ROOT));
        let mut listeners = self.listeners.borrow_mut();
        for listener in listeners.iter_mut() {
            listener.on_finalize();
        }
    }

    /// Node at the top of the stack: the region currently being
    /// timed. This is the root whenever no region is open.
    pub fn current_node(&self) -> NodeId {
        top(&self.inner.borrow().stack)
    }

    /// Read-only access to the region tree, for reporters and manual
    /// traversal.
    pub fn with_tree<R>(&self, f: impl FnOnce(&RegionTree) -> R) -> R {
        f(&self.inner.borrow().tree)
    }

    /// Resolve or create the fetch node for an iterator proxy without
    /// entering it. Returns `None` (and warns) when the profiler is
    /// already finalized, so no node appears in the frozen tree.
    pub(crate) fn resolve_iter_node(&self, global: bool, name: &str) -> Option<NodeId> {
        let mut inner = self.inner.borrow_mut();
        if inner.finalized {
            warn!(region = name, "iteration started after finalize; passing through");
            return None;
        }
        let parent = if global { NodeId::ROOT } else { top(&inner.stack) };
        Some(inner.tree.get_child(parent, name))
    }

    /// Resolve-or-create, push and enter. Returns `None` (and warns)
    /// when the profiler is already finalized.
    pub(crate) fn open_region(&self, global: bool, name: &str) -> Option<NodeId> {
        let node = {
            let mut inner = self.inner.borrow_mut();
            if inner.finalized {
                warn!(region = name, "region opened after finalize; ignoring");
                return None;
            }
            let parent = if global { NodeId::ROOT } else { top(&inner.stack) };
            let node = inner.tree.get_child(parent, name);
            inner.stack.push(node);
            inner.tree.enter_region(node);
            node
        };
        self.notify(|l, tree| l.on_enter(tree, node));
        Some(node)
    }

    /// Exit the region, notify, pop. The exact inverse of a
    /// successful [`open_region`](Self::open_region).
    pub(crate) fn close_region(&self, node: NodeId) {
        self.inner.borrow_mut().tree.exit_region(node);
        self.notify(|l, tree| l.on_exit(tree, node));
        let mut inner = self.inner.borrow_mut();
        debug_assert_eq!(inner.stack.last(), Some(&node), "region stack out of order");
        inner.stack.pop();
    }

    /// Discard the in-flight measurement of the stack-top region.
    pub(crate) fn cancel_region(&self, node: NodeId) {
        self.inner.borrow_mut().tree.cancel_region(node);
        self.notify(|l, tree| l.on_cancel(tree, node));
    }

    /// One pull of the iterator proxy: enter the fetch region, pull
    /// the upstream, then exit (timed sample) or cancel (end of
    /// sequence or unwinding).
    pub(crate) fn iter_step<I: Iterator>(&self, node: NodeId, upstream: &mut I) -> Option<I::Item> {
        if self.open_region_at(node).is_none() {
            // Finalized profiler: pass values through untimed.
            return upstream.next();
        }
        let step = StepGuard {
            profiler: self,
            node,
        };
        match upstream.next() {
            Some(item) => {
                // Completed fetch: plain exit records the sample.
                mem::forget(step);
                self.close_region(node);
                Some(item)
            }
            // End of sequence: `step` cancels on drop.
            None => None,
        }
    }

    /// Push and enter an already-resolved node.
    fn open_region_at(&self, node: NodeId) -> Option<NodeId> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.finalized {
                warn!("iteration step after finalize; passing through");
                return None;
            }
            inner.stack.push(node);
            inner.tree.enter_region(node);
        }
        self.notify(|l, tree| l.on_enter(tree, node));
        Some(node)
    }

    fn notify(&self, mut f: impl FnMut(&mut dyn RegionListener, &RegionTree)) {
        let inner = self.inner.borrow();
        let mut listeners = self.listeners.borrow_mut();
        for listener in listeners.iter_mut() {
            f(listener.as_mut(), &inner.tree);
        }
    }
}

impl Default for RegionProfiler {
    fn default() -> Self {
        Self::new()
    }
}

fn top(stack: &[NodeId]) -> NodeId {
    stack.last().copied().unwrap_or(NodeId::ROOT)
}

/// RAII handle for an open region.
///
/// Dropping the guard exits the region, notifies listeners and pops
/// the node stack, including during panic unwinding.
#[must_use = "dropping the guard immediately closes the region"]
pub struct RegionGuard<'p> {
    profiler: &'p RegionProfiler,
    node: Option<NodeId>,
}

impl RegionGuard<'_> {
    /// Node of the guarded region, or `None` for an inert guard
    /// (profiler already finalized).
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

impl Drop for RegionGuard<'_> {
    fn drop(&mut self) {
        if let Some(node) = self.node.take() {
            self.profiler.close_region(node);
        }
    }
}

/// Cancels and closes the in-flight fetch region unless defused.
///
/// Covers both the end-of-sequence probe and a panicking upstream
/// iterator: in either case the measurement is discarded and the
/// stack popped before control leaves the proxy.
struct StepGuard<'p> {
    profiler: &'p RegionProfiler,
    node: NodeId,
}

impl Drop for StepGuard<'_> {
    fn drop(&mut self) {
        self.profiler.cancel_region(self.node);
        // The pairing exit clears the cancelled flag; no sample is
        // recorded.
        self.profiler.close_region(self.node);
    }
}

/// Lazy, single-pass iterator proxy produced by
/// [`RegionProfiler::iterate`].
///
/// Observably identical in yielded values to the wrapped iterator;
/// fused after the first `None`.
pub struct ProfiledIter<'p, I> {
    profiler: &'p RegionProfiler,
    inner: I,
    node: Option<NodeId>,
    done: bool,
}

impl<I> ProfiledIter<'_, I> {
    /// Node accumulating the per-fetch samples, or `None` for a
    /// pass-through proxy (profiler already finalized).
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

impl<I: Iterator> Iterator for ProfiledIter<'_, I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if self.done {
            return None;
        }
        let item = match self.node {
            Some(node) => self.profiler.iter_step(node, &mut self.inner),
            None => self.inner.next(),
        };
        if item.is_none() {
            self.done = true;
        }
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            self.inner.size_hint()
        }
    }
}
