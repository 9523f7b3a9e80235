//! Call-site derived region names.
//!
//! When a region is not given an explicit name, one is derived from
//! the place in the source that opened it, in the form
//! `"{function} <{file}:{line}>"`. Rust has no runtime stack
//! introspection to lean on, so the [`callsite!`] macro captures the
//! location lexically at compile time; the [`region!`] and
//! [`region_global!`] macros combine it with a profiler in one step,
//! and [`wrap_fn!`] / [`iterate!`] do the same for the function
//! wrapper and the iterator proxy.

/// Location of a region's opening call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// Name of the enclosing function, without its module path.
    pub function: &'static str,
    /// Source file as reported by `file!`.
    pub file: &'static str,
    /// 1-based source line.
    pub line: u32,
}

impl CallSite {
    /// Region name for a block: `"{function} <{basename}:{line}>"`.
    pub fn block_label(&self) -> String {
        format!("{} <{}:{}>", self.function, basename(self.file), self.line)
    }

    /// Region name for a wrapped function: `"{function}()"`.
    pub fn function_label(&self) -> String {
        format!("{}()", self.function)
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Extract the enclosing function's short name from the type name of
/// a probe item declared inside it.
#[doc(hidden)]
pub fn enclosing_function(probe: &'static str) -> &'static str {
    let name = probe.strip_suffix("::__region_probe").unwrap_or(probe);
    let mut name = name;
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    name.rsplit("::").next().unwrap_or(name)
}

/// Short name of a function value, derived from its type.
///
/// Named function items carry their full path in the type; a closure
/// is named after the function that defined it.
pub fn function_name_of<F>(_: &F) -> &'static str {
    enclosing_function(std::any::type_name::<F>())
}

/// Capture the current call site as a [`CallSite`].
///
/// ```
/// let site = region_profiler::callsite!();
/// assert!(site.block_label().contains(&format!(":{}", site.line)));
/// ```
#[macro_export]
macro_rules! callsite {
    () => {{
        fn __region_probe() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::CallSite {
            function: $crate::callsite::enclosing_function(__type_name_of(__region_probe)),
            file: ::core::file!(),
            line: ::core::line!(),
        }
    }};
}

/// Open a region on a profiler, naming it after the call site when no
/// explicit name is given.
///
/// ```
/// use region_profiler::{region, RegionProfiler};
///
/// let profiler = RegionProfiler::new();
/// {
///     let _auto = region!(profiler);
///     let _named = region!(profiler, "inner");
/// }
/// ```
#[macro_export]
macro_rules! region {
    ($profiler:expr) => {
        $profiler.region(&$crate::callsite!().block_label())
    };
    ($profiler:expr, $name:expr) => {
        $profiler.region($name)
    };
}

/// Like [`region!`], but the region is attached to the root instead
/// of the current nesting.
#[macro_export]
macro_rules! region_global {
    ($profiler:expr) => {
        $profiler.region_global(&$crate::callsite!().block_label())
    };
    ($profiler:expr, $name:expr) => {
        $profiler.region_global($name)
    };
}

/// Wrap a function in a timed region named after the function itself.
///
/// `wrap_fn!(profiler, work)` times each call under `"work()"`; an
/// explicit name may be given as the middle argument. Closures take
/// the name of the function that created them.
///
/// ```
/// use region_profiler::{wrap_fn, RegionProfiler};
///
/// fn work(x: u32) -> u32 {
///     x * 2
/// }
///
/// let profiler = RegionProfiler::new();
/// let mut timed = wrap_fn!(profiler, work);
/// assert_eq!(timed(21), 42);
/// ```
#[macro_export]
macro_rules! wrap_fn {
    ($profiler:expr, $f:expr) => {{
        let f = $f;
        let name = $crate::callsite::function_name_of(&f);
        $profiler.wrap_fn(name, f)
    }};
    ($profiler:expr, $name:expr, $f:expr) => {
        $profiler.wrap_fn($name, $f)
    };
}

/// Proxy an iterable through a profiler, naming the fetch region
/// after the call site when no explicit name is given.
///
/// ```
/// use region_profiler::{iterate, RegionProfiler};
///
/// let profiler = RegionProfiler::new();
/// let total: i32 = iterate!(profiler, [1, 2, 3]).sum();
/// assert_eq!(total, 6);
/// ```
#[macro_export]
macro_rules! iterate {
    ($profiler:expr, $iterable:expr) => {
        $profiler.iterate($iterable, &$crate::callsite!().block_label())
    };
    ($profiler:expr, $iterable:expr, $name:expr) => {
        $profiler.iterate($iterable, $name)
    };
}
