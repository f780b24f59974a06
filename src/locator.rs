//! Service locators built on a [`SingletonMap`].
//!
//! A locator is any type that owns one singleton map and exposes its services
//! as accessor methods. The [`Locator`] trait provides the shared behaviour;
//! implementors only hand out their map.
//!
//! [`ServiceLocator`] and [`ChildServiceLocator`] are ready-made owners to embed
//! in application types. A child keeps its parent alive through an `Arc`, so
//! parent-scoped services stay reachable for as long as the child exists.

use std::any::type_name;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::{SingletonError, SingletonMap};

/// Key type used by locators: accessor paths or caller-chosen names.
pub type LocatorKey = Cow<'static, str>;

/// Core trait defining locator behaviour.
///
/// Provides default implementations for every operation, requiring only
/// [`singletons`](Locator::singletons) from the implementor.
///
/// # Examples
///
/// ```rust
/// use service_locator::{
///     singleton, Locator, LocatorKey, ServiceLocator, SingletonError, SingletonMap,
/// };
/// use std::sync::Arc;
///
/// struct Config {
///     url: String,
/// }
///
/// #[derive(Default)]
/// struct AppServices {
///     base: ServiceLocator,
/// }
///
/// impl Locator for AppServices {
///     fn singletons(&self) -> &SingletonMap<LocatorKey> {
///         self.base.singletons()
///     }
/// }
///
/// impl AppServices {
///     fn config(&self) -> Result<Arc<Config>, SingletonError> {
///         singleton!(self, || Config { url: "postgres://localhost".into() })
///     }
/// }
///
/// let app = AppServices::default();
/// assert!(Arc::ptr_eq(&app.config().unwrap(), &app.config().unwrap()));
/// ```
pub trait Locator {
    /// Access the map backing this locator's singletons.
    fn singletons(&self) -> &SingletonMap<LocatorKey>;

    /// Hook invoked once when the locator's scope starts, before any singleton is used.
    fn activate(&self) {}

    /// Hook invoked once when the locator's scope ends.
    fn deactivate(&self) {}

    /// Returns the singleton stored under `key`, building it with `factory` on first use.
    ///
    /// Accessors usually go through [`singleton!`](crate::singleton), which derives
    /// `key` from the accessor's own path.
    ///
    /// # Errors
    ///
    /// See [`SingletonMap::get_value`].
    fn singleton<T, F>(
        &self,
        key: impl Into<LocatorKey>,
        factory: F,
    ) -> Result<Arc<T>, SingletonError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.singletons().get_value(key.into(), factory)
    }

    /// Like [`singleton`](Locator::singleton), for factories that can fail.
    ///
    /// Handy when a factory depends on other accessors and wants to use `?`.
    ///
    /// # Errors
    ///
    /// See [`SingletonMap::try_get_value`].
    fn try_singleton<T, E, F>(
        &self,
        key: impl Into<LocatorKey>,
        factory: F,
    ) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        E: From<SingletonError>,
        F: FnOnce() -> Result<T, E>,
    {
        self.singletons().try_get_value(key.into(), factory)
    }
}

/// A root locator: owns one singleton map and nothing else.
#[derive(Debug, Default)]
pub struct ServiceLocator {
    singletons: SingletonMap<LocatorKey>,
}

impl ServiceLocator {
    /// Creates a locator whose map uses the default bucket count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a locator whose map uses `bucket_count` buckets.
    ///
    /// # Errors
    ///
    /// Returns [`SingletonError::InvalidBucketCount`] when `bucket_count` is zero.
    pub fn with_bucket_count(bucket_count: usize) -> Result<Self, SingletonError> {
        Ok(Self {
            singletons: SingletonMap::with_bucket_count(bucket_count)?,
        })
    }
}

impl Locator for ServiceLocator {
    fn singletons(&self) -> &SingletonMap<LocatorKey> {
        &self.singletons
    }
}

/// A locator scoped inside a parent locator.
///
/// Its singletons are separate from the parent's; factories reach parent-scoped
/// services through [`parent`](ChildServiceLocator::parent).
pub struct ChildServiceLocator<P> {
    parent: Arc<P>,
    singletons: SingletonMap<LocatorKey>,
}

impl<P> ChildServiceLocator<P> {
    /// Creates a child of `parent` with the default bucket count.
    pub fn new(parent: Arc<P>) -> Self {
        Self {
            parent,
            singletons: SingletonMap::new(),
        }
    }

    /// Creates a child of `parent` whose map uses `bucket_count` buckets.
    ///
    /// # Errors
    ///
    /// Returns [`SingletonError::InvalidBucketCount`] when `bucket_count` is zero.
    pub fn with_bucket_count(
        parent: Arc<P>,
        bucket_count: usize,
    ) -> Result<Self, SingletonError> {
        Ok(Self {
            parent,
            singletons: SingletonMap::with_bucket_count(bucket_count)?,
        })
    }

    /// The parent locator.
    pub fn parent(&self) -> &P {
        &self.parent
    }

    /// The shared handle to the parent locator.
    pub fn parent_arc(&self) -> &Arc<P> {
        &self.parent
    }
}

impl<P> Locator for ChildServiceLocator<P> {
    fn singletons(&self) -> &SingletonMap<LocatorKey> {
        &self.singletons
    }
}

impl<P> fmt::Debug for ChildServiceLocator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildServiceLocator")
            .field("parent", &type_name::<P>())
            .field("singletons", &self.singletons)
            .finish()
    }
}
