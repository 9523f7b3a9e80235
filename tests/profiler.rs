//! End-to-end tests of the profiler's region tree and call stack.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

use region_profiler::{
    ManualClock, NodeId, ProfilerConfig, RegionListener, RegionProfiler, RegionTree, SeqStats,
};

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn profiler_with_clock() -> (RegionProfiler, ManualClock) {
    let clock = ManualClock::new();
    let profiler =
        RegionProfiler::with_config(ProfilerConfig::new().with_clock(Rc::new(clock.clone())));
    (profiler, clock)
}

/// "a" stays open while "b" is visited three times; "a"'s inner time
/// is its total minus "b"'s total.
#[test]
fn nested_regions_aggregate_by_name() {
    let (profiler, clock) = profiler_with_clock();

    let (a_id, b_id) = {
        let a = profiler.region("a");
        let a_id = a.node().unwrap();
        let mut b_id = None;
        for _ in 0..3 {
            clock.advance(secs(1));
            let b = profiler.region("b");
            b_id = b.node();
            clock.advance(secs(1));
        }
        clock.advance(secs(1));
        (a_id, b_id.unwrap())
    };
    profiler.finalize();

    profiler.with_tree(|tree| {
        assert_eq!(
            tree.stats(b_id),
            SeqStats::with_values(3, secs(3), secs(1), secs(1))
        );
        // "a" spans its full window, from enter at t=0 to exit at t=7.
        assert_eq!(tree.stats(a_id).count, 1);
        assert_eq!(tree.stats(a_id).total, secs(7));
        let inner = tree.stats(a_id).total - tree.stats(b_id).total;
        assert_eq!(inner, secs(4));
    });
}

#[test]
fn same_name_under_different_parents_never_aliases() {
    let (profiler, _clock) = profiler_with_clock();

    let inner_under_a = {
        let _a = profiler.region("a");
        profiler.region("step").node().unwrap()
    };
    let inner_under_b = {
        let _b = profiler.region("b");
        profiler.region("step").node().unwrap()
    };
    assert_ne!(inner_under_a, inner_under_b);
}

fn descend(profiler: &RegionProfiler, clock: &ManualClock, depth: u32) {
    let _region = profiler.region("descend()");
    clock.advance(secs(1));
    if depth > 1 {
        descend(profiler, clock, depth - 1);
    }
}

#[test]
fn recursion_records_one_outermost_sample() {
    let (profiler, clock) = profiler_with_clock();

    descend(&profiler, &clock, 3);

    let node = profiler.with_tree(|tree| {
        let id = find_child(tree, NodeId::ROOT, "descend()").unwrap();
        (tree.stats(id), tree.node(id).recursion_depth())
    });
    // One sample spanning the outermost call, not three summed legs.
    assert_eq!(node.0, SeqStats::with_values(1, secs(3), secs(3), secs(3)));
    assert_eq!(node.1, 0);
}

#[test]
fn panicking_region_still_pops_the_stack() {
    let (profiler, clock) = profiler_with_clock();

    let result = catch_unwind(AssertUnwindSafe(|| {
        let _region = profiler.region("boom");
        clock.advance(secs(2));
        panic!("instrumented code failed");
    }));
    assert!(result.is_err());

    // The guard closed the region on unwind: the stack is back at the
    // root and the interrupted visit was recorded.
    assert_eq!(profiler.current_node(), NodeId::ROOT);
    profiler.with_tree(|tree| {
        let id = find_child(tree, NodeId::ROOT, "boom").unwrap();
        assert_eq!(tree.stats(id).count, 1);
        assert!(!tree.node(id).is_active());
    });

    // Subsequent timings on this profiler remain usable.
    {
        let _region = profiler.region("after");
        clock.advance(secs(1));
    }
    profiler.with_tree(|tree| {
        let id = find_child(tree, NodeId::ROOT, "after").unwrap();
        assert_eq!(tree.stats(id).total, secs(1));
    });
}

#[test]
fn iterating_n_elements_records_n_samples() {
    let (profiler, clock) = profiler_with_clock();

    let values: Vec<i32> = profiler
        .iterate([10, 20, 30], "fetch")
        .inspect(|_| clock.advance(secs(1)))
        .collect();
    assert_eq!(values, [10, 20, 30]);

    profiler.with_tree(|tree| {
        let id = find_child(tree, NodeId::ROOT, "fetch").unwrap();
        // The terminal end-of-sequence probe is the 4th attempt and
        // is cancelled, not counted.
        assert_eq!(tree.stats(id).count, 3);
        assert!(!tree.node(id).is_active());
    });
}

#[test]
fn iterating_empty_input_counts_nothing() {
    let (profiler, _clock) = profiler_with_clock();

    let values: Vec<i32> = profiler.iterate(Vec::new(), "fetch").collect();
    assert!(values.is_empty());

    profiler.with_tree(|tree| {
        assert_eq!(tree.node(NodeId::ROOT).child_count(), 1);
        let id = find_child(tree, NodeId::ROOT, "fetch").unwrap();
        assert_eq!(tree.stats(id).count, 0);
        assert!(!tree.node(id).is_active());
    });
    assert_eq!(profiler.current_node(), NodeId::ROOT);
}

#[test]
fn iterator_proxy_is_fused() {
    let (profiler, _clock) = profiler_with_clock();
    let mut proxy = profiler.iterate(0..1, "fetch");
    assert_eq!(proxy.next(), Some(0));
    assert_eq!(proxy.next(), None);
    assert_eq!(proxy.next(), None);
    profiler.with_tree(|tree| {
        let id = find_child(tree, NodeId::ROOT, "fetch").unwrap();
        assert_eq!(tree.stats(id).count, 1);
    });
}

struct FailingIter(u32);

impl Iterator for FailingIter {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        self.0 += 1;
        if self.0 > 1 {
            panic!("upstream source broke");
        }
        Some(self.0)
    }
}

#[test]
fn upstream_panic_cancels_the_inflight_fetch() {
    let (profiler, clock) = profiler_with_clock();

    let result = catch_unwind(AssertUnwindSafe(|| {
        for item in profiler.iterate(FailingIter(0), "fetch") {
            let _ = item;
            clock.advance(secs(1));
        }
    }));
    assert!(result.is_err());

    assert_eq!(profiler.current_node(), NodeId::ROOT);
    profiler.with_tree(|tree| {
        let id = find_child(tree, NodeId::ROOT, "fetch").unwrap();
        // Only the successful first fetch counts; the failing one was
        // cancelled before the panic propagated.
        assert_eq!(tree.stats(id).count, 1);
        assert!(!tree.node(id).is_active());
    });
}

#[test]
fn iterate_binds_its_node_to_the_opening_parent() {
    let (profiler, _clock) = profiler_with_clock();

    {
        let outer = profiler.region("outer");
        let outer_id = outer.node().unwrap();
        let proxy = profiler.iterate(0..2, "fetch");
        for _ in proxy {}
        profiler.with_tree(|tree| {
            assert!(find_child(tree, outer_id, "fetch").is_some());
            assert!(find_child(tree, NodeId::ROOT, "fetch").is_none());
        });
    }
}

#[test]
fn global_regions_merge_call_paths() {
    let (profiler, clock) = profiler_with_clock();

    for parent in ["a", "b"] {
        let _parent = profiler.region(parent);
        let shared = profiler.region_global("shared");
        assert_eq!(
            profiler.with_tree(|tree| find_child(tree, NodeId::ROOT, "shared")),
            shared.node()
        );
        clock.advance(secs(1));
    }

    profiler.with_tree(|tree| {
        let id = find_child(tree, NodeId::ROOT, "shared").unwrap();
        assert_eq!(tree.stats(id).count, 2);
        // The shared node hangs off the root, not off "a" or "b".
        let a = find_child(tree, NodeId::ROOT, "a").unwrap();
        assert!(find_child(tree, a, "shared").is_none());
    });
}

#[test]
fn wrapped_functions_get_the_call_suffix() {
    let (profiler, clock) = profiler_with_clock();

    {
        let mut double = profiler.wrap_fn("double", |x: u32| {
            clock.advance(secs(1));
            x * 2
        });
        assert_eq!(double(21), 42);
        assert_eq!(double(5), 10);
    }

    profiler.with_tree(|tree| {
        let id = find_child(tree, NodeId::ROOT, "double()").unwrap();
        assert_eq!(
            tree.stats(id),
            SeqStats::with_values(2, secs(2), secs(1), secs(1))
        );
    });
}

#[test]
fn finalize_is_idempotent_and_later_regions_are_inert() {
    let (profiler, clock) = profiler_with_clock();
    clock.advance(secs(5));
    profiler.finalize();
    profiler.finalize();

    let before = profiler.with_tree(|tree| tree.stats(NodeId::ROOT));
    assert_eq!(before.total, secs(5));

    {
        let late = profiler.region("late");
        assert!(late.node().is_none());
        clock.advance(secs(3));
    }
    profiler.with_tree(|tree| {
        // No node was created and the session reading is frozen.
        assert_eq!(tree.node(NodeId::ROOT).child_count(), 0);
        assert_eq!(tree.stats(NodeId::ROOT).total, secs(5));
    });
}

#[test]
fn iteration_after_finalize_passes_through_untimed() {
    let (profiler, _clock) = profiler_with_clock();
    profiler.finalize();

    let proxy = profiler.iterate([1, 2, 3], "fetch");
    assert!(proxy.node().is_none());
    let values: Vec<i32> = proxy.collect();
    assert_eq!(values, [1, 2, 3]);

    // The frozen tree gained no node for the late iteration.
    profiler.with_tree(|tree| assert_eq!(tree.len(), 1));
}

#[test]
fn current_node_tracks_the_stack_top() {
    let (profiler, _clock) = profiler_with_clock();
    assert_eq!(profiler.current_node(), NodeId::ROOT);
    {
        let outer = profiler.region("outer");
        assert_eq!(Some(profiler.current_node()), outer.node());
        {
            let inner = profiler.region("inner");
            assert_eq!(Some(profiler.current_node()), inner.node());
        }
        assert_eq!(Some(profiler.current_node()), outer.node());
    }
    assert_eq!(profiler.current_node(), NodeId::ROOT);
}

#[derive(Default)]
struct RecordingListener {
    events: Rc<RefCell<Vec<String>>>,
}

impl RegionListener for RecordingListener {
    fn on_enter(&mut self, tree: &RegionTree, node: NodeId) {
        self.record("enter", tree, node);
    }

    fn on_exit(&mut self, tree: &RegionTree, node: NodeId) {
        self.record("exit", tree, node);
    }

    fn on_cancel(&mut self, tree: &RegionTree, node: NodeId) {
        self.record("cancel", tree, node);
    }

    fn on_finalize(&mut self) {
        self.events.borrow_mut().push("finalize".to_string());
    }
}

impl RecordingListener {
    fn record(&self, event: &str, tree: &RegionTree, node: NodeId) {
        self.events
            .borrow_mut()
            .push(format!("{event}:{}", tree.node(node).name()));
    }
}

#[test]
fn listeners_see_every_event_in_order() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let listener = RecordingListener {
        events: Rc::clone(&events),
    };
    let profiler = RegionProfiler::with_config(ProfilerConfig::new().with_listener(listener));

    {
        let _a = profiler.region("a");
        let _b = profiler.region("b");
    }
    for _ in profiler.iterate(0..1, "fetch") {}
    profiler.finalize();

    assert_eq!(
        *events.borrow(),
        [
            "enter:<main>",
            "enter:a",
            "enter:b",
            "exit:b",
            "exit:a",
            "enter:fetch",
            "exit:fetch",
            "enter:fetch",
            "cancel:fetch",
            "exit:fetch",
            "exit:<main>",
            "finalize",
        ]
    );
}

fn find_child(tree: &RegionTree, parent: NodeId, name: &str) -> Option<NodeId> {
    tree.node(parent)
        .children()
        .find(|&id| tree.node(id).name() == name)
}
