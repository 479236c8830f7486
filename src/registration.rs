//! Registration storage shared by the locator.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::key::Key;

#[cfg(feature = "ahash")]
type KeyHasher = ahash::RandomState;
#[cfg(not(feature = "ahash"))]
type KeyHasher = std::collections::hash_map::RandomState;

pub(crate) type KeyMap<V> = HashMap<Key, V, KeyHasher>;

/// Type-erased `Arc` for storage. For a key `K` it always wraps an `Arc<K>`.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

// Type-erased factory producing an `AnyArc` wrapping `Arc<K>`
pub(crate) type AnyFactory = Arc<dyn Fn() -> AnyArc + Send + Sync>;

/// Boxed factory accepted by the `try_register_factory` entry point.
pub type Factory<K> = Box<dyn Fn() -> Arc<K> + Send + Sync>;

/// Erases a typed instance for storage.
#[inline]
pub(crate) fn erase<K: ?Sized + Send + Sync + 'static>(instance: Arc<K>) -> AnyArc {
    Arc::new(instance)
}

/// Erases a typed factory for storage.
pub(crate) fn erase_factory<K, F>(factory: F) -> AnyFactory
where
    K: ?Sized + Send + Sync + 'static,
    F: Fn() -> Arc<K> + Send + Sync + 'static,
{
    Arc::new(move || erase(factory()))
}

/// Checked downcast back to the typed instance.
#[inline]
pub(crate) fn restore<K: ?Sized + Send + Sync + 'static>(any: &AnyArc) -> Option<Arc<K>> {
    (**any).downcast_ref::<Arc<K>>().cloned()
}

/// What a lookup found for a key, read under the lock.
pub(crate) enum Slot {
    /// Key was never registered (or was cleared)
    Missing,
    /// Entry exists and holds an instance
    Ready(AnyArc),
    /// Entry exists, unset, with a factory to run
    Pending(AnyFactory),
    /// Entry exists, unset, and nothing can produce it
    NoFactory,
}

/// What happened when a value was written into an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Written {
    Inserted,
    Replaced,
}

/// The two maps guarded by the locator lock.
///
/// `instances` holds one entry per registered key; `None` marks an entry
/// registered through a factory and not yet materialized. `factories` is kept
/// apart so that a factory can be swapped without touching a cached instance.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) instances: KeyMap<Option<AnyArc>>,
    pub(crate) factories: KeyMap<AnyFactory>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn slot(&self, key: &Key) -> Slot {
        match self.instances.get(key) {
            None => Slot::Missing,
            Some(Some(instance)) => Slot::Ready(instance.clone()),
            Some(None) => match self.factories.get(key) {
                Some(factory) => Slot::Pending(factory.clone()),
                None => Slot::NoFactory,
            },
        }
    }

    /// Associates a factory; the cached instance (if any) is left alone.
    pub(crate) fn set_factory(&mut self, key: Key, factory: AnyFactory) -> Written {
        if self.instances.contains_key(&key) {
            self.factories.insert(key, factory);
            Written::Replaced
        } else {
            self.instances.insert(key, None);
            self.factories.insert(key, factory);
            Written::Inserted
        }
    }

    /// Stores an instance; the factory map is left alone.
    pub(crate) fn set_instance(&mut self, key: Key, instance: AnyArc) -> Written {
        match self.instances.insert(key, Some(instance)) {
            Some(_) => Written::Replaced,
            None => Written::Inserted,
        }
    }

    /// Writes back a freshly materialized value.
    ///
    /// Returns the value callers should see: an instance registered while the
    /// factory ran wins over the produced one. Nothing is cached if the entry
    /// vanished (the registry was cleared from inside the factory).
    pub(crate) fn settle(&mut self, key: Key, produced: AnyArc) -> (AnyArc, bool) {
        let Some(slot) = self.instances.get_mut(&key) else {
            return (produced, false);
        };
        if let Some(existing) = slot.as_ref() {
            return (existing.clone(), false);
        }
        *slot = Some(produced.clone());
        (produced, true)
    }

    pub(crate) fn clear(&mut self) -> usize {
        let entries = self.instances.len();
        self.instances.clear();
        self.factories.clear();
        entries
    }

    pub(crate) fn len(&self) -> usize {
        self.instances.len()
    }

    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.instances.contains_key(key)
    }

    pub(crate) fn is_materialized(&self, key: &Key) -> bool {
        matches!(self.instances.get(key), Some(Some(_)))
    }

    pub(crate) fn has_factory(&self, key: &Key) -> bool {
        self.factories.contains_key(key)
    }
}
