//! Tests of call-site naming through the exported macros.

use region_profiler::{iterate, region, region_global, wrap_fn, NodeId, RegionProfiler, RegionTree};

fn child_names(tree: &RegionTree) -> Vec<String> {
    tree.node(NodeId::ROOT)
        .children()
        .map(|id| tree.node(id).name().to_string())
        .collect()
}

#[test]
fn auto_named_region_carries_function_file_and_line() {
    let profiler = RegionProfiler::new();
    let name = {
        let guard = region!(profiler);
        let node = guard.node().unwrap();
        profiler.with_tree(|tree| tree.node(node).name().to_string())
    };
    assert!(
        name.starts_with("auto_named_region_carries_function_file_and_line <macros.rs:"),
        "unexpected region name: {name}"
    );
    assert!(name.ends_with('>'));
}

#[test]
fn explicit_name_bypasses_call_site_capture() {
    let profiler = RegionProfiler::new();
    {
        let guard = region!(profiler, "load");
        let node = guard.node().unwrap();
        profiler.with_tree(|tree| assert_eq!(tree.node(node).name(), "load"));
    }
}

#[test]
fn distinct_call_sites_get_distinct_nodes() {
    let profiler = RegionProfiler::new();
    let first = {
        let guard = region!(profiler);
        guard.node().unwrap()
    };
    let second = {
        let guard = region!(profiler);
        guard.node().unwrap()
    };
    // Same function, different lines.
    assert_ne!(first, second);
}

fn triple(x: u32) -> u32 {
    x * 3
}

#[test]
fn wrapped_function_is_named_after_itself() {
    let profiler = RegionProfiler::new();
    {
        let mut timed = wrap_fn!(profiler, triple);
        assert_eq!(timed(2), 6);
    }
    profiler.with_tree(|tree| assert_eq!(child_names(tree), ["triple()"]));
}

#[test]
fn wrapped_closure_takes_the_defining_function_name() {
    let profiler = RegionProfiler::new();
    {
        let mut timed = wrap_fn!(profiler, |x: u32| x + 1);
        assert_eq!(timed(1), 2);
    }
    profiler.with_tree(|tree| {
        assert_eq!(
            child_names(tree),
            ["wrapped_closure_takes_the_defining_function_name()"]
        );
    });
}

#[test]
fn wrap_fn_macro_accepts_an_explicit_name() {
    let profiler = RegionProfiler::new();
    {
        let mut timed = wrap_fn!(profiler, "halve", |x: u32| x / 2);
        assert_eq!(timed(8), 4);
    }
    profiler.with_tree(|tree| assert_eq!(child_names(tree), ["halve()"]));
}

#[test]
fn auto_named_iteration_carries_the_call_site() {
    let profiler = RegionProfiler::new();
    let values: Vec<i32> = iterate!(profiler, [1, 2]).collect();
    assert_eq!(values, [1, 2]);
    profiler.with_tree(|tree| {
        let names = child_names(tree);
        assert_eq!(names.len(), 1);
        assert!(
            names[0].starts_with("auto_named_iteration_carries_the_call_site <macros.rs:"),
            "unexpected fetch name: {}",
            names[0]
        );
    });
}

#[test]
fn iterate_macro_accepts_an_explicit_name() {
    let profiler = RegionProfiler::new();
    let count = iterate!(profiler, 0..4, "fetch").count();
    assert_eq!(count, 4);
    profiler.with_tree(|tree| assert_eq!(child_names(tree), ["fetch"]));
}

#[test]
fn global_macro_attaches_to_the_root() {
    let profiler = RegionProfiler::new();
    {
        let _outer = region!(profiler, "outer");
        let shared = region_global!(profiler);
        let node = shared.node().unwrap();
        profiler.with_tree(|tree| {
            let under_root = tree
                .node(NodeId::ROOT)
                .children()
                .any(|id| id == node);
            assert!(under_root);
        });
    }
}
