//! Macros for writing locator accessors.
//!
//! Each accessor is keyed by its own path by default, so one accessor maps to
//! exactly one singleton without spelling out key strings.

/// Expands to the `&'static str` path of the enclosing function.
///
/// Closure segments are dropped, so the key is the same whether the macro is
/// used directly in an accessor or inside a closure within it.
///
/// # Examples
///
/// ```rust
/// use service_locator::accessor_key;
///
/// fn database() -> &'static str {
///     accessor_key!()
/// }
///
/// assert!(database().ends_with("::database"));
/// ```
#[macro_export]
macro_rules! accessor_key {
    () => {{
        fn __accessor() {}
        $crate::__private::accessor_path(::std::any::type_name_of_val(&__accessor))
    }};
}

/// Returns a locator singleton, building it on first use.
///
/// `singleton!(locator, factory)` keys the value by the calling accessor's path;
/// `singleton!(locator, key = expr, factory)` uses an explicit key.
///
/// # Examples
///
/// ```rust
/// use service_locator::{singleton, Locator, ServiceLocator};
/// use std::sync::Arc;
///
/// fn counter(locator: &ServiceLocator) -> Arc<u64> {
///     singleton!(locator, || 7u64).unwrap()
/// }
///
/// let locator = ServiceLocator::new();
/// assert!(Arc::ptr_eq(&counter(&locator), &counter(&locator)));
///
/// let keyed = singleton!(&locator, key = "tenant-1", || String::from("acme")).unwrap();
/// assert_eq!(&*keyed, "acme");
/// ```
#[macro_export]
macro_rules! singleton {
    ($locator:expr, key = $key:expr, $factory:expr $(,)?) => {
        $crate::Locator::singleton($locator, $key, $factory)
    };
    ($locator:expr, $factory:expr $(,)?) => {
        $crate::Locator::singleton($locator, $crate::accessor_key!(), $factory)
    };
}

/// Fallible form of [`singleton!`]; the factory returns a `Result`.
///
/// # Examples
///
/// ```rust
/// use service_locator::{try_singleton, Locator, ServiceLocator, SingletonError};
/// use std::sync::Arc;
///
/// fn port(locator: &ServiceLocator) -> Result<Arc<u16>, SingletonError> {
///     try_singleton!(locator, || Ok(8080u16))
/// }
///
/// assert_eq!(*port(&ServiceLocator::new()).unwrap(), 8080);
/// ```
#[macro_export]
macro_rules! try_singleton {
    ($locator:expr, key = $key:expr, $factory:expr $(,)?) => {
        $crate::Locator::try_singleton($locator, $key, $factory)
    };
    ($locator:expr, $factory:expr $(,)?) => {
        $crate::Locator::try_singleton($locator, $crate::accessor_key!(), $factory)
    };
}

/// Strips the helper item and any closure segments from a path produced by
/// [`accessor_key!`].
#[doc(hidden)]
pub fn accessor_path(raw: &'static str) -> &'static str {
    let mut path = raw.strip_suffix("::__accessor").unwrap_or(raw);
    while let Some(outer) = path.strip_suffix("::{{closure}}") {
        path = outer;
    }
    path
}
