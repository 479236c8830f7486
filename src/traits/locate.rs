//! Lookup traits for instance resolution.

use std::sync::Arc;

use crate::error::{LocatorError, LocatorResult};
use crate::key::{key_of, Key};
use crate::registration::{restore, AnyArc};

/// Core lookup trait for object-safe instance resolution.
///
/// This is the seam composition code can depend on (`&dyn LocateCore`)
/// instead of the concrete [`InstanceLocator`](crate::InstanceLocator).
/// Most callers use the generic [`Locate`] methods built on top of it.
pub trait LocateCore: Send + Sync {
    /// Resolves the type-erased instance stored under `key`.
    ///
    /// Returns the cached instance, materializes it through the registered
    /// factory on first use, or returns `None` (with a logged warning) when
    /// nothing can be produced. Never fails the caller.
    fn locate_any(&self, key: &Key) -> Option<AnyArc>;

    /// Reports a stored value that did not downcast to the requested type.
    ///
    /// [`InstanceLocator`](crate::InstanceLocator) stores every value under
    /// its own key and never mismatches; stores that map keys by other means
    /// can override this to surface the error. The default does nothing.
    fn report_mismatch(&self, _key: &Key) {}
}

/// High-level lookup interface with generic, type-safe methods.
///
/// Blanket-implemented for every [`LocateCore`], including trait objects.
///
/// # Examples
///
/// ```
/// use instance_locator::{InstanceLocator, Locate};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".to_string()
///     }
/// }
///
/// let locator = InstanceLocator::new();
/// locator.register_instance::<dyn Greeter>(Arc::new(English));
///
/// let greeter = locator.get_instance::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// assert!(locator.get_instance::<String>().is_none());
/// ```
pub trait Locate: LocateCore {
    /// Resolves the instance registered for `K`.
    ///
    /// `K` may be a concrete type or an unsized contract such as `dyn Trait`.
    /// Returns `None` when the key is unknown, its entry is unset without a
    /// factory, or the nested lookup was refused as a cycle.
    fn get_instance<K>(&self) -> Option<Arc<K>>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        self.try_get::<K>().ok()
    }

    /// Resolves the instance registered for `K`, explaining a failure.
    ///
    /// * `Err(NotFound)` - nothing could be produced for `K`
    /// * `Err(TypeMismatch)` - the stored value is not an `Arc<K>`
    fn try_get<K>(&self) -> LocatorResult<Arc<K>>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        let key = key_of::<K>();
        let any = self
            .locate_any(&key)
            .ok_or(LocatorError::NotFound(key.display_name()))?;
        restore::<K>(&any).ok_or_else(|| {
            self.report_mismatch(&key);
            LocatorError::TypeMismatch(key.display_name())
        })
    }

    /// Resolves the instance registered for `K`, panicking on failure.
    ///
    /// For composition code where a missing service is a configuration bug.
    ///
    /// # Panics
    ///
    /// Panics if no instance can be produced for `K`.
    fn get_required<K>(&self) -> Arc<K>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        self.try_get::<K>()
            .unwrap_or_else(|e| panic!("Failed to locate {}: {}", std::any::type_name::<K>(), e))
    }

    /// Resolves and clones a sized instance.
    fn get_cloned<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get_instance::<T>().map(|arc| (*arc).clone())
    }
}

impl<L: LocateCore + ?Sized> Locate for L {}
