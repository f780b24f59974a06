//! Striped, lazily-initialized singleton storage.
//!
//! A [`SingletonMap`] memoizes one value per key. Keys are spread over a fixed
//! set of buckets, each guarded by its own mutex and condition variable, so
//! unrelated keys rarely contend. For every key the factory runs at most once
//! at a time, and every caller receives the same `Arc`.
//!
//! Factories run with no bucket lock held. A factory may therefore request
//! other keys from the same map, even keys that land in the same bucket.
//!
//! Requesting a key from inside its own factory on the same thread is reported
//! as [`SingletonError::CyclicDependency`]. A cycle that crosses threads (thread
//! one builds `a` which needs `b`, while thread two builds `b` which needs `a`)
//! is not detected and blocks both threads forever.

use std::any::{type_name, Any};
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use crate::{SingletonError, SingletonEvent};

/// Bucket count used by [`SingletonMap::new`].
pub const DEFAULT_BUCKET_COUNT: usize = if cfg!(any(
    target_os = "ios",
    target_os = "android",
    target_os = "watchos",
    target_os = "tvos"
)) {
    8
} else {
    64
};

/// Type-erased memoized value.
type Erased = Arc<dyn Any + Send + Sync>;

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives every [`SingletonEvent`] emitted by one map. It is never
/// invoked while a bucket lock is held, so it may call back into the map.
pub type TraceCallback<K> = dyn Fn(&SingletonEvent<'_, K>) + Send + Sync + 'static;

/// State of a requested key. A key with no slot has never been requested.
enum Slot {
    /// A factory is running on `owner`.
    Pending { owner: ThreadId },
    /// Construction finished. Never changes again.
    Ready(Erased),
}

/// Slots of one bucket plus the number of callers parked on its condition variable.
struct Table<K> {
    slots: HashMap<K, Slot>,
    parked: usize,
}

/// One independently locked partition of the map.
struct Bucket<K> {
    table: Mutex<Table<K>>,
    settled: Condvar,
}

impl<K> Bucket<K> {
    fn new() -> Self {
        Self {
            table: Mutex::new(Table {
                slots: HashMap::new(),
                parked: 0,
            }),
            settled: Condvar::new(),
        }
    }

    // Factories never run under this lock, so poisoning cannot leave a half-written table.
    fn lock(&self) -> MutexGuard<'_, Table<K>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Claim on a `Pending` slot held by the constructing thread.
///
/// Dropping an unsettled claim fails the construction: the slot is removed, the
/// bucket is woken and a `Failed` event is emitted. That is the panic path.
struct Construction<'a, K>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    map: &'a SingletonMap<K>,
    bucket: &'a Bucket<K>,
    key: K,
    type_name: &'static str,
    settled: bool,
}

impl<K> Construction<'_, K>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    fn settle(&mut self, value: Option<Erased>) {
        let mut table = self.bucket.lock();
        match value {
            Some(value) => {
                if let Some(slot) = table.slots.get_mut(&self.key) {
                    *slot = Slot::Ready(value);
                }
            }
            None => {
                table.slots.remove(&self.key);
            }
        }
        self.settled = true;
        // One bucket serves many keys, so every waiter has to re-check.
        self.bucket.settled.notify_all();
    }

    fn fail(&mut self) {
        self.settle(None);
        self.map.emit_event(&SingletonEvent::Failed {
            key: &self.key,
            type_name: self.type_name,
        });
    }
}

impl<K> Drop for Construction<'_, K>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(
                key = ?self.key,
                "singleton factory panicked, releasing its key for retry"
            );
            self.fail();
        }
    }
}

/// A thread-safe map that builds each value lazily and exactly once.
///
/// # Examples
///
/// ```rust
/// use service_locator::SingletonMap;
/// use std::sync::Arc;
///
/// let map = SingletonMap::new();
///
/// let first: Arc<String> = map.get_value("greeting", || "hello".to_string()).unwrap();
/// let second: Arc<String> = map.get_value("greeting", || "ignored".to_string()).unwrap();
///
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(&*second, "hello");
/// ```
pub struct SingletonMap<K> {
    buckets: Box<[Bucket<K>]>,
    hasher: RandomState,
    trace: Mutex<Option<Arc<TraceCallback<K>>>>,
}

impl<K> SingletonMap<K>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    /// Creates a map with [`DEFAULT_BUCKET_COUNT`] buckets.
    pub fn new() -> Self {
        Self::build(DEFAULT_BUCKET_COUNT)
    }

    /// Creates a map with the given number of buckets.
    ///
    /// # Errors
    ///
    /// Returns [`SingletonError::InvalidBucketCount`] when `bucket_count` is zero.
    pub fn with_bucket_count(bucket_count: usize) -> Result<Self, SingletonError> {
        if bucket_count == 0 {
            return Err(SingletonError::InvalidBucketCount);
        }
        Ok(Self::build(bucket_count))
    }

    fn build(bucket_count: usize) -> Self {
        Self {
            buckets: (0..bucket_count).map(|_| Bucket::new()).collect(),
            hasher: RandomState::new(),
            trace: Mutex::new(None),
        }
    }

    /// Number of buckets. Fixed for the lifetime of the map.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Index of the bucket that holds `key`.
    ///
    /// Stable for the lifetime of the map; two maps may place the same key differently.
    pub fn bucket_index(&self, key: &K) -> usize {
        (self.hasher.hash_one(key) % self.buckets.len() as u64) as usize
    }

    fn bucket_for(&self, key: &K) -> &Bucket<K> {
        &self.buckets[self.bucket_index(key)]
    }

    /// Returns the value for `key`, running `factory` if no value exists yet.
    ///
    /// If another thread is already running a factory for `key`, the caller blocks
    /// until that value is ready and `factory` is dropped unused.
    ///
    /// A panicking factory releases the key, so a later call (or a thread that was
    /// waiting) runs its own factory. The panic continues into the caller.
    ///
    /// # Errors
    ///
    /// - [`SingletonError::TypeMismatch`] if `key` already holds a value that is not a `T`
    /// - [`SingletonError::CyclicDependency`] if `key` is requested from inside its own
    ///   factory on the constructing thread
    pub fn get_value<T, F>(&self, key: K, factory: F) -> Result<Arc<T>, SingletonError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.try_get_value(key, || Ok(factory()))
    }

    /// Like [`get_value`](Self::get_value), for factories that can fail.
    ///
    /// An `Err` from `factory` resets the key to empty and is returned unchanged,
    /// so the next request runs a factory again.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_locator::{SingletonError, SingletonMap};
    ///
    /// let map = SingletonMap::with_bucket_count(1).unwrap();
    ///
    /// let failed = map.try_get_value::<u32, SingletonError, _>("port", || {
    ///     Err(SingletonError::InvalidBucketCount)
    /// });
    /// assert!(failed.is_err());
    ///
    /// let port = map.get_value("port", || 8080u32).unwrap();
    /// assert_eq!(*port, 8080);
    /// ```
    ///
    /// # Errors
    ///
    /// The factory's own error, or any [`SingletonError`] that
    /// [`get_value`](Self::get_value) reports, converted into `E`.
    pub fn try_get_value<T, E, F>(&self, key: K, factory: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        E: From<SingletonError>,
        F: FnOnce() -> Result<T, E>,
    {
        let requested = type_name::<T>();
        let bucket = self.bucket_for(&key);
        let current = thread::current().id();
        let mut table = bucket.lock();
        let mut waited = false;

        loop {
            match table.slots.get(&key) {
                None => break,
                Some(Slot::Pending { owner }) if *owner == current => {
                    drop(table);
                    tracing::error!(key = ?key, "singleton requested from its own factory");
                    return Err(SingletonError::CyclicDependency {
                        key: format!("{key:?}"),
                    }
                    .into());
                }
                Some(Slot::Pending { .. }) => {
                    if !waited {
                        tracing::trace!(key = ?key, "waiting for singleton under construction");
                    }
                    waited = true;
                    table.parked += 1;
                    // Wakes for other keys in this bucket are expected; the loop re-checks.
                    table = bucket
                        .settled
                        .wait(table)
                        .unwrap_or_else(PoisonError::into_inner);
                    table.parked -= 1;
                }
                Some(Slot::Ready(value)) => {
                    let value = Arc::clone(value);
                    drop(table);

                    let value = value.downcast::<T>().map_err(|_| SingletonError::TypeMismatch {
                        key: format!("{key:?}"),
                        type_name: requested,
                    })?;

                    self.emit_event(&SingletonEvent::Get {
                        key: &key,
                        type_name: requested,
                        waited,
                    });

                    return Ok(value);
                }
            }
        }

        table
            .slots
            .insert(key.clone(), Slot::Pending { owner: current });
        drop(table);

        let mut construction = Construction {
            map: self,
            bucket,
            key,
            type_name: requested,
            settled: false,
        };

        self.emit_event(&SingletonEvent::Construct {
            key: &construction.key,
            type_name: requested,
        });
        tracing::debug!(key = ?construction.key, type_name = requested, "constructing singleton");

        match factory() {
            Ok(value) => {
                let value = Arc::new(value);
                let erased: Erased = value.clone();
                construction.settle(Some(erased));

                self.emit_event(&SingletonEvent::Ready {
                    key: &construction.key,
                    type_name: requested,
                });

                Ok(value)
            }
            Err(err) => {
                tracing::debug!(key = ?construction.key, "singleton factory failed");
                construction.fail();
                Err(err)
            }
        }
    }

    /// Whether `key` already holds a finished value.
    ///
    /// Keys under construction report `false`. Never blocks on a factory.
    pub fn contains(&self, key: &K) -> bool {
        matches!(
            self.bucket_for(key).lock().slots.get(key),
            Some(Slot::Ready(_))
        )
    }

    /// Number of callers currently blocked on another thread's factory, across all buckets.
    pub fn waiting_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.lock().parked).sum()
    }

    /// Set a tracing callback for this map.
    ///
    /// The callback replaces any previous one and is invoked for every event
    /// listed in [`SingletonEvent`]. `Failed` for a panicking factory is emitted
    /// while the panic unwinds; a callback that panics there aborts the process.
    pub fn set_trace_callback(
        &self,
        callback: impl Fn(&SingletonEvent<'_, K>) + Send + Sync + 'static,
    ) {
        let mut guard = self.trace.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(callback));
    }

    /// Clear the tracing callback.
    pub fn clear_trace_callback(&self) {
        let mut guard = self.trace.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    fn emit_event(&self, event: &SingletonEvent<'_, K>) {
        // Clone the callback out so it runs without the trace lock held.
        let callback = self
            .trace
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }
}

impl<K> Default for SingletonMap<K>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for SingletonMap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonMap")
            .field("bucket_count", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
