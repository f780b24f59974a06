//! # Service Locator
//!
//! Thread-safe service locators backed by a lazily-initialized singleton map.
//!
//! Every locator owns one [`SingletonMap`]. The map builds each value on first
//! request, exactly once, and hands the same `Arc` to every caller. Keys are
//! spread over independently locked buckets, so unrelated services never wait
//! on each other, and factories may freely request other services while they run.
//!
//! ## Quick Start
//!
//! ```rust
//! use service_locator::{
//!     singleton, ChildServiceLocator, Locator, LocatorKey, ServiceLocator, SingletonError,
//!     SingletonMap,
//! };
//! use std::sync::Arc;
//!
//! struct Database;
//! struct Session {
//!     database: Arc<Database>,
//! }
//!
//! #[derive(Default)]
//! struct AppServices {
//!     base: ServiceLocator,
//! }
//!
//! impl Locator for AppServices {
//!     fn singletons(&self) -> &SingletonMap<LocatorKey> {
//!         self.base.singletons()
//!     }
//! }
//!
//! impl AppServices {
//!     fn database(&self) -> Result<Arc<Database>, SingletonError> {
//!         singleton!(self, || Database)
//!     }
//! }
//!
//! struct UserServices {
//!     base: ChildServiceLocator<AppServices>,
//! }
//!
//! impl Locator for UserServices {
//!     fn singletons(&self) -> &SingletonMap<LocatorKey> {
//!         self.base.singletons()
//!     }
//! }
//!
//! impl UserServices {
//!     fn session(&self) -> Result<Arc<Session>, SingletonError> {
//!         let database = self.base.parent().database()?;
//!         singleton!(self, || Session { database })
//!     }
//! }
//!
//! let app = Arc::new(AppServices::default());
//! let user = UserServices { base: ChildServiceLocator::new(app.clone()) };
//!
//! let session = user.session().unwrap();
//! assert!(Arc::ptr_eq(&session.database, &app.database().unwrap()));
//! ```
//!
//! ## Main Items
//!
//! - [`SingletonMap`] - striped, memoizing key to value map
//! - [`Locator`] - trait providing `singleton`, `try_singleton` and lifecycle hooks
//! - [`ServiceLocator`] / [`ChildServiceLocator`] - map owners to embed in locator types
//! - [`singleton!`] / [`try_singleton!`] - accessor helpers keyed by the accessor's path
//! - [`SingletonEvent`] - events passed to a map's trace callback

mod locator;
mod macros;
mod singleton_error;
mod singleton_event;
mod singleton_map;

pub use locator::{ChildServiceLocator, Locator, LocatorKey, ServiceLocator};
pub use singleton_error::SingletonError;
pub use singleton_event::SingletonEvent;
pub use singleton_map::{SingletonMap, TraceCallback, DEFAULT_BUCKET_COUNT};

#[doc(hidden)]
pub mod __private {
    pub use crate::macros::accessor_path;
}
