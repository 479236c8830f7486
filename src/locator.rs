//! The instance locator.
//!
//! A thread-safe, lazily-populated cache of singleton instances addressed by
//! capability key. Startup code registers factories and eager instances;
//! application code later looks them up, and factories run at most once per
//! registration.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::ReentrantMutex;

use crate::error::{LocatorError, LocatorResult};
use crate::internal::{MaterializeFrame, Refusal, DEFAULT_MAX_DEPTH};
use crate::key::{key_of, Key};
use crate::observer::{LocatorEvent, LocatorObserver, Observers};
use crate::registration::{erase, erase_factory, AnyArc, AnyFactory, Factory, Registry, Slot, Written};
use crate::traits::LocateCore;

#[cfg(feature = "once-cell")]
static CURRENT: once_cell::sync::OnceCell<InstanceLocator> = once_cell::sync::OnceCell::new();
#[cfg(not(feature = "once-cell"))]
static CURRENT: std::sync::OnceLock<InstanceLocator> = std::sync::OnceLock::new();

/// Thread-safe instance locator.
///
/// Stores at most one instance per key. A key is registered either with a
/// ready instance or with a factory that is invoked on first lookup; the
/// produced instance is then cached for every later lookup.
///
/// # Thread Safety
///
/// A single lock guards the instance map and the factory map together, so
/// the check-then-materialize step of a lookup is atomic with respect to
/// concurrent registration and clearing: concurrent first lookups of a
/// factory-backed key run the factory once. The lock is re-entrant for the
/// owning thread, which lets a factory resolve other services from the same
/// locator while it runs.
///
/// A slow factory blocks every other user of the locator for its duration.
///
/// # Examples
///
/// ```
/// use instance_locator::{InstanceLocator, Locate};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// trait Counter: Send + Sync {
///     fn next(&self) -> usize;
/// }
///
/// #[derive(Default)]
/// struct AtomicCounter(AtomicUsize);
/// impl Counter for AtomicCounter {
///     fn next(&self) -> usize {
///         self.0.fetch_add(1, Ordering::SeqCst) + 1
///     }
/// }
///
/// let locator = InstanceLocator::new();
/// locator.register_factory::<dyn Counter, _>(|| Arc::new(AtomicCounter::default()));
///
/// let a = locator.get_required::<dyn Counter>();
/// let b = locator.get_required::<dyn Counter>();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(a.next(), 1);
/// assert_eq!(b.next(), 2);
/// ```
pub struct InstanceLocator {
    state: ReentrantMutex<RefCell<Registry>>,
    observers: Observers,
    max_depth: usize,
}

impl InstanceLocator {
    /// Creates an empty locator with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a locator.
    pub fn builder() -> LocatorBuilder {
        LocatorBuilder::default()
    }

    /// Returns the process-wide locator, creating it on first call.
    ///
    /// Safe under concurrent first access: every caller receives the same
    /// object for the remainder of the process. The process-wide locator is
    /// never dropped; [`clear_instances`](Self::clear_instances) only resets
    /// its contents.
    ///
    /// ```
    /// use instance_locator::InstanceLocator;
    ///
    /// let a = InstanceLocator::current();
    /// let b = InstanceLocator::current();
    /// assert!(std::ptr::eq(a, b));
    /// ```
    pub fn current() -> &'static InstanceLocator {
        CURRENT.get_or_init(|| {
            tracing::debug!("creating process-wide instance locator");
            InstanceLocator::new()
        })
    }

    /// Registers a factory for `K`, invoked on the first lookup.
    ///
    /// If `K` has no entry yet, an unset entry is created. If it already has
    /// one (materialized or not), only the factory is replaced; a cached
    /// instance is kept and keeps being returned.
    pub fn register_factory<K, F>(&self, factory: F)
    where
        K: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<K> + Send + Sync + 'static,
    {
        self.store_factory(key_of::<K>(), erase_factory(factory));
    }

    /// Registers a factory for `K`, rejecting an absent one.
    ///
    /// # Errors
    ///
    /// `InvalidArgument("factory")` if `factory` is `None`; the locator is
    /// left unchanged.
    pub fn try_register_factory<K>(&self, factory: Option<Factory<K>>) -> LocatorResult<()>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        let factory = factory.ok_or(LocatorError::InvalidArgument("factory"))?;
        self.register_factory::<K, _>(factory);
        Ok(())
    }

    /// Registers `T::default` as the factory for `T`.
    ///
    /// To key a default-constructed `T` by a contract instead, register the
    /// factory explicitly: `register_factory::<dyn K, _>(|| Arc::new(T::default()))`.
    pub fn register_default_factory<T>(&self)
    where
        T: Default + Send + Sync + 'static,
    {
        self.register_factory::<T, _>(|| Arc::new(T::default()));
    }

    /// Registers a ready instance for `K`.
    ///
    /// Overwrites the cached value of an existing entry; the factory map is
    /// not touched.
    pub fn register_instance<K>(&self, instance: Arc<K>)
    where
        K: ?Sized + Send + Sync + 'static,
    {
        self.store_instance(key_of::<K>(), erase(instance));
    }

    /// Registers a ready instance for `K`, rejecting an absent one.
    ///
    /// # Errors
    ///
    /// `InvalidArgument("instance")` if `instance` is `None`; the locator is
    /// left unchanged.
    pub fn try_register_instance<K>(&self, instance: Option<Arc<K>>) -> LocatorResult<()>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        let instance = instance.ok_or(LocatorError::InvalidArgument("instance"))?;
        self.register_instance(instance);
        Ok(())
    }

    /// Registers a value under its own type.
    pub fn register<T>(&self, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.register_instance(Arc::new(value));
    }

    /// Constructs `T::default()` and registers it under `T`.
    ///
    /// For a contract key use
    /// `register_instance::<dyn K>(Arc::new(T::default()))`.
    pub fn register_default_instance<T>(&self)
    where
        T: Default + Send + Sync + 'static,
    {
        self.register(T::default());
    }

    /// Discards every cached instance and factory.
    ///
    /// Atomic with respect to concurrent lookups. The locator itself stays
    /// usable; previously registered keys behave as never registered.
    /// `Arc`s already handed out remain valid.
    pub fn clear_instances(&self) {
        let guard = self.state.lock();
        let entries = guard.borrow_mut().clear();
        self.observers.emit(LocatorEvent::Cleared { entries });
    }

    /// Number of entries, materialized or not.
    pub fn total_instances(&self) -> usize {
        self.state.lock().borrow().len()
    }

    /// Whether `K` has an entry, materialized or not.
    pub fn contains<K: ?Sized + 'static>(&self) -> bool {
        self.state.lock().borrow().contains_key(&key_of::<K>())
    }

    /// Whether `K` currently holds an instance.
    pub fn is_materialized<K: ?Sized + 'static>(&self) -> bool {
        self.state.lock().borrow().is_materialized(&key_of::<K>())
    }

    /// Whether a factory is held for `K`.
    pub fn has_factory<K: ?Sized + 'static>(&self) -> bool {
        self.state.lock().borrow().has_factory(&key_of::<K>())
    }

    /// Attaches an observer at runtime.
    pub fn add_observer(&self, observer: Arc<dyn LocatorObserver>) {
        self.observers.add(observer);
    }

    /// Renders every entry sorted by type name with its state
    /// (`materialized`, `pending` or `unset`) and whether a factory is held.
    ///
    /// ```
    /// use instance_locator::InstanceLocator;
    ///
    /// let locator = InstanceLocator::new();
    /// locator.register(1u8);
    /// assert!(locator.to_debug_string().contains("u8: materialized (factory: false)"));
    /// ```
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let guard = self.state.lock();
        let registry = guard.borrow();

        let mut entries: Vec<(&'static str, &'static str, bool)> = registry
            .instances
            .iter()
            .map(|(key, slot)| {
                let has_factory = registry.factories.contains_key(key);
                let state = match (slot, has_factory) {
                    (Some(_), _) => "materialized",
                    (None, true) => "pending",
                    (None, false) => "unset",
                };
                (key.display_name(), state, has_factory)
            })
            .collect();
        entries.sort_unstable();

        let mut s = String::new();
        s.push_str("=== Instance Locator Debug ===\n");
        s.push_str(&format!("Entries: {}\n", entries.len()));
        for (name, state, has_factory) in entries {
            s.push_str(&format!("  {}: {} (factory: {})\n", name, state, has_factory));
        }
        s.push_str(&format!("Observers: {}\n", self.observers.len()));
        s
    }

    fn store_factory(&self, key: Key, factory: AnyFactory) {
        let guard = self.state.lock();
        let written = guard.borrow_mut().set_factory(key, factory);
        self.observers.emit(match written {
            Written::Inserted => LocatorEvent::FactoryRegistered { key },
            Written::Replaced => LocatorEvent::FactoryReplaced { key },
        });
    }

    fn store_instance(&self, key: Key, instance: AnyArc) {
        let guard = self.state.lock();
        let written = guard.borrow_mut().set_instance(key, instance);
        self.observers.emit(match written {
            Written::Inserted => LocatorEvent::InstanceRegistered { key },
            Written::Replaced => LocatorEvent::InstanceReplaced { key },
        });
    }

    #[inline]
    fn id(&self) -> usize {
        self as *const Self as usize
    }
}

impl LocateCore for InstanceLocator {
    fn locate_any(&self, key: &Key) -> Option<AnyArc> {
        let guard = self.state.lock();
        // The borrow ends here; the lock stays held until we return
        let slot = guard.borrow().slot(key);

        let factory = match slot {
            Slot::Ready(instance) => return Some(instance),
            Slot::Missing => {
                self.observers.emit(LocatorEvent::Missing { key: *key });
                return None;
            }
            Slot::NoFactory => {
                self.observers.emit(LocatorEvent::FactoryMissing { key: *key });
                return None;
            }
            Slot::Pending(factory) => factory,
        };

        let _frame = match MaterializeFrame::enter(self.id(), *key, self.max_depth) {
            Ok(frame) => frame,
            Err(Refusal::Cycle(path)) => {
                self.observers.emit(LocatorEvent::CycleRefused { key: *key, path });
                return None;
            }
            Err(Refusal::TooDeep(depth)) => {
                self.observers.emit(LocatorEvent::DepthExceeded { key: *key, depth });
                return None;
            }
        };

        let started = Instant::now();
        let produced = (*factory)();
        let elapsed = started.elapsed();

        let (instance, cached) = guard.borrow_mut().settle(*key, produced);
        if cached {
            self.observers.emit(LocatorEvent::Materialized { key: *key, elapsed });
        }
        Some(instance)
    }
}

impl Default for InstanceLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InstanceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceLocator")
            .field("total_instances", &self.total_instances())
            .field("observers", &self.observers.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Builder for [`InstanceLocator`].
///
/// ```
/// use instance_locator::{InstanceLocator, MetricsObserver};
/// use std::sync::Arc;
///
/// let metrics = Arc::new(MetricsObserver::new());
/// let locator = InstanceLocator::builder()
///     .observer(metrics.clone())
///     .max_depth(64)
///     .build();
///
/// assert_eq!(locator.total_instances(), 0);
/// ```
pub struct LocatorBuilder {
    observers: Vec<Arc<dyn LocatorObserver>>,
    max_depth: usize,
}

impl Default for LocatorBuilder {
    fn default() -> Self {
        Self {
            observers: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl LocatorBuilder {
    /// Attaches an observer receiving every locator event.
    pub fn observer(mut self, observer: Arc<dyn LocatorObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Caps how many factories may be materializing at once on one thread
    /// (factories resolving services from inside factories).
    ///
    /// Values below 1 are raised to 1.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    /// Builds the locator.
    pub fn build(self) -> InstanceLocator {
        InstanceLocator {
            state: ReentrantMutex::new(RefCell::new(Registry::new())),
            observers: Observers::new(self.observers),
            max_depth: self.max_depth,
        }
    }
}
