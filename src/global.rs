//! Thread-local default profiler instance.
//!
//! A profiler models a single logical thread, so the convenience
//! default instance is thread-local: each thread that calls
//! [`install`] gets its own session. All functions here are inert
//! when nothing is installed, so instrumentation can stay in place
//! in code paths that only sometimes run under profiling.
//!
//! ```
//! use region_profiler::{global, ProfilerConfig};
//!
//! global::install(ProfilerConfig::new());
//! {
//!     let _region = global::region("setup");
//! }
//! global::uninstall();
//! ```

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use tracing::warn;

use crate::config::ProfilerConfig;
use crate::error::ProfilerError;
use crate::node::NodeId;
use crate::output::Reporter;
use crate::profiler::RegionProfiler;

thread_local! {
    static DEFAULT: RefCell<Option<Rc<RegionProfiler>>> = const { RefCell::new(None) };
}

/// Install the default profiler for the current thread.
///
/// Idempotent: a second call is reported as a warning and ignored,
/// keeping the original instance. Returns whether this call installed.
pub fn install(config: ProfilerConfig) -> bool {
    DEFAULT.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            warn!("install() must be called only once per thread; keeping existing profiler");
            false
        } else {
            *slot = Some(Rc::new(RegionProfiler::with_config(config)));
            true
        }
    })
}

/// Whether a default profiler is installed on this thread.
pub fn installed() -> bool {
    DEFAULT.with(|slot| slot.borrow().is_some())
}

/// Finalize and drop the default profiler, allowing a later
/// [`install`]. No-op when nothing is installed.
pub fn uninstall() {
    if let Some(profiler) = take() {
        profiler.finalize();
    }
}

/// Run `f` against the default profiler, if one is installed.
pub fn with_profiler<R>(f: impl FnOnce(&RegionProfiler) -> R) -> Option<R> {
    instance().map(|profiler| f(&profiler))
}

/// Finalize the default profiler and write a report of its final
/// state. The profiler stays installed (finalization is idempotent),
/// so several reporters may run in sequence.
pub fn finalize_and_report(
    reporter: &dyn Reporter,
    out: &mut dyn Write,
) -> Result<(), ProfilerError> {
    if let Some(profiler) = instance() {
        profiler.finalize();
        reporter.write_report(&profiler, out)?;
    }
    Ok(())
}

/// Open a region on the default profiler; inert when none installed.
pub fn region(name: &str) -> ScopedRegion {
    ScopedRegion::open(instance(), name, false)
}

/// Open a region under the root of the default profiler.
pub fn region_global(name: &str) -> ScopedRegion {
    ScopedRegion::open(instance(), name, true)
}

/// Wrap a function so each invocation runs inside a region named
/// `"{name}()"` on the default profiler.
///
/// The default instance is looked up at call time, so wrappers built
/// before [`install`] start profiling once it runs.
pub fn wrap_fn<F, A, R>(name: &str, mut f: F) -> impl FnMut(A) -> R
where
    F: FnMut(A) -> R,
{
    let label = format!("{name}()");
    move |arg| {
        let _region = ScopedRegion::open(instance(), &label, false);
        f(arg)
    }
}

/// Proxy an iterable through the default profiler, timing each fetch.
///
/// Passes values through untimed when nothing is installed or the
/// installed profiler is already finalized.
pub fn iterate<I: IntoIterator>(iterable: I, name: &str) -> GlobalIter<I::IntoIter> {
    let profiler = instance();
    let node = profiler
        .as_ref()
        .and_then(|p| p.resolve_iter_node(false, name));
    GlobalIter {
        profiler,
        node,
        inner: iterable.into_iter(),
        done: false,
    }
}

/// Like [`iterate`], attaching the fetch region to the root.
pub fn iterate_global<I: IntoIterator>(iterable: I, name: &str) -> GlobalIter<I::IntoIter> {
    let profiler = instance();
    let node = profiler
        .as_ref()
        .and_then(|p| p.resolve_iter_node(true, name));
    GlobalIter {
        profiler,
        node,
        inner: iterable.into_iter(),
        done: false,
    }
}

fn instance() -> Option<Rc<RegionProfiler>> {
    DEFAULT.with(|slot| slot.borrow().clone())
}

fn take() -> Option<Rc<RegionProfiler>> {
    DEFAULT.with(|slot| slot.borrow_mut().take())
}

/// Owned RAII handle for a region on the default profiler.
///
/// Unlike [`RegionGuard`](crate::RegionGuard) this holds the profiler
/// alive by reference count, so it stays valid across an
/// [`uninstall`] happening inside the guarded scope.
#[must_use = "dropping the guard immediately closes the region"]
pub struct ScopedRegion {
    profiler: Option<Rc<RegionProfiler>>,
    node: Option<NodeId>,
}

impl ScopedRegion {
    fn open(profiler: Option<Rc<RegionProfiler>>, name: &str, global: bool) -> Self {
        match profiler {
            Some(profiler) => {
                let node = profiler.open_region(global, name);
                Self {
                    profiler: Some(profiler),
                    node,
                }
            }
            None => Self {
                profiler: None,
                node: None,
            },
        }
    }

    /// Node of the guarded region, `None` for an inert guard.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

impl Drop for ScopedRegion {
    fn drop(&mut self) {
        if let (Some(profiler), Some(node)) = (self.profiler.take(), self.node.take()) {
            profiler.close_region(node);
        }
    }
}

/// Iterator proxy over the default profiler.
pub struct GlobalIter<I> {
    profiler: Option<Rc<RegionProfiler>>,
    node: Option<NodeId>,
    inner: I,
    done: bool,
}

impl<I: Iterator> Iterator for GlobalIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if self.done {
            return None;
        }
        let item = match (&self.profiler, self.node) {
            (Some(profiler), Some(node)) => profiler.iter_step(node, &mut self.inner),
            _ => self.inner.next(),
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
