//! Diagnostic observers for locator traceability.
//!
//! Every registration, replacement, materialization and lookup miss is turned
//! into a [`LocatorEvent`]. The locator always writes the event to the
//! `tracing` facade; observers attached to a locator receive the same events
//! for in-process inspection (tests, metrics, debugging overlays).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::Key;

/// Events emitted by the instance locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorEvent {
    /// A factory was associated with a key that had no entry.
    FactoryRegistered { key: Key },
    /// The factory of an existing entry was swapped; its instance was kept.
    FactoryReplaced { key: Key },
    /// An instance was stored for a key that had no entry.
    InstanceRegistered { key: Key },
    /// The instance of an existing entry was overwritten.
    InstanceReplaced { key: Key },
    /// A factory ran and its result was cached.
    Materialized { key: Key, elapsed: Duration },
    /// Lookup of a key that has no entry.
    Missing { key: Key },
    /// Lookup of an unset entry that has no factory.
    FactoryMissing { key: Key },
    /// A nested lookup was refused to break a materialization cycle.
    CycleRefused { key: Key, path: Vec<&'static str> },
    /// A nested lookup was refused because materializations nested too deep.
    DepthExceeded { key: Key, depth: usize },
    /// All entries and factories were discarded.
    Cleared { entries: usize },
}

impl LocatorEvent {
    /// The key this event is about, if any.
    pub fn key(&self) -> Option<&Key> {
        match self {
            LocatorEvent::FactoryRegistered { key }
            | LocatorEvent::FactoryReplaced { key }
            | LocatorEvent::InstanceRegistered { key }
            | LocatorEvent::InstanceReplaced { key }
            | LocatorEvent::Materialized { key, .. }
            | LocatorEvent::Missing { key }
            | LocatorEvent::FactoryMissing { key }
            | LocatorEvent::CycleRefused { key, .. }
            | LocatorEvent::DepthExceeded { key, .. } => Some(key),
            LocatorEvent::Cleared { .. } => None,
        }
    }

    /// Whether this event is logged at warning level.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            LocatorEvent::Missing { .. }
                | LocatorEvent::FactoryMissing { .. }
                | LocatorEvent::CycleRefused { .. }
                | LocatorEvent::DepthExceeded { .. }
        )
    }

    /// Writes the event to the `tracing` facade.
    pub(crate) fn log(&self) {
        match self {
            LocatorEvent::Materialized { key, elapsed } => tracing::debug!(
                key = key.display_name(),
                elapsed_us = elapsed.as_micros() as u64,
                "{}",
                self
            ),
            LocatorEvent::Cleared { entries } => tracing::debug!(entries, "{}", self),
            event if event.is_warning() => tracing::warn!(
                key = event.key().map(Key::display_name).unwrap_or_default(),
                "{}",
                event
            ),
            event => tracing::debug!(
                key = event.key().map(Key::display_name).unwrap_or_default(),
                "{}",
                event
            ),
        }
    }
}

impl fmt::Display for LocatorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorEvent::FactoryRegistered { key } => write!(f, "factory of [{}] registered", key),
            LocatorEvent::FactoryReplaced { key } => write!(f, "factory of [{}] replaced", key),
            LocatorEvent::InstanceRegistered { key } => write!(f, "instance of [{}] registered", key),
            LocatorEvent::InstanceReplaced { key } => write!(f, "instance of [{}] replaced", key),
            LocatorEvent::Materialized { key, elapsed } => {
                write!(f, "instance of [{}] created in {:?}", key, elapsed)
            }
            LocatorEvent::Missing { key } => write!(f, "interface not found: [{}]", key),
            LocatorEvent::FactoryMissing { key } => write!(f, "factory of [{}] not found", key),
            LocatorEvent::CycleRefused { path, .. } => {
                write!(f, "materialization cycle refused: {}", path.join(" -> "))
            }
            LocatorEvent::DepthExceeded { key, depth } => {
                write!(f, "materialization of [{}] refused at depth {}", key, depth)
            }
            LocatorEvent::Cleared { entries } => write!(f, "locator cleared ({} entries)", entries),
        }
    }
}

/// Observer trait for locator events.
///
/// Observer calls are made synchronously on the thread performing the
/// operation, with the locator lock held. Keep implementations lightweight.
/// Observers are invoked after the locator has released its internal map
/// borrow, so they may call back into the locator on the same thread.
///
/// # Examples
///
/// ```
/// use instance_locator::{InstanceLocator, LocatorEvent, LocatorObserver, Locate};
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl LocatorObserver for Recorder {
///     fn observe(&self, event: &LocatorEvent) {
///         self.0.lock().unwrap().push(event.to_string());
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let locator = InstanceLocator::builder().observer(recorder.clone()).build();
///
/// locator.register(1u8);
/// locator.register(2u8);
/// assert!(locator.get_instance::<u16>().is_none());
///
/// let seen = recorder.0.lock().unwrap();
/// assert_eq!(seen[0], "instance of [u8] registered");
/// assert_eq!(seen[1], "instance of [u8] replaced");
/// assert_eq!(seen[2], "interface not found: [u16]");
/// ```
pub trait LocatorObserver: Send + Sync {
    /// Called for every event emitted by the locator.
    fn observe(&self, event: &LocatorEvent);
}

/// Container for registered observers.
#[derive(Default)]
pub(crate) struct Observers {
    observers: RwLock<Vec<Arc<dyn LocatorObserver>>>,
}

impl Observers {
    pub(crate) fn new(observers: Vec<Arc<dyn LocatorObserver>>) -> Self {
        Self {
            observers: RwLock::new(observers),
        }
    }

    pub(crate) fn add(&self, observer: Arc<dyn LocatorObserver>) {
        self.observers.write().push(observer);
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.read().len()
    }

    /// Logs the event and notifies all observers.
    pub(crate) fn emit(&self, event: LocatorEvent) {
        event.log();

        // Snapshot so an observer may add observers without deadlocking
        let observers = {
            let guard = self.observers.read();
            if guard.is_empty() {
                return;
            }
            guard.clone()
        };
        for observer in &observers {
            observer.observe(&event);
        }
    }
}

/// Observer that counts locator activity.
///
/// # Examples
///
/// ```
/// use instance_locator::{InstanceLocator, MetricsObserver, Locate};
/// use std::sync::Arc;
///
/// let metrics = Arc::new(MetricsObserver::new());
/// let locator = InstanceLocator::builder().observer(metrics.clone()).build();
///
/// locator.register_factory::<String, _>(|| Arc::new("ready".to_string()));
/// let _ = locator.get_instance::<String>();
/// let _ = locator.get_instance::<u32>();
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.registrations, 1);
/// assert_eq!(snapshot.materializations, 1);
/// assert_eq!(snapshot.misses, 1);
/// ```
#[derive(Debug, Default)]
pub struct MetricsObserver {
    registrations: AtomicU64,
    replacements: AtomicU64,
    materializations: AtomicU64,
    misses: AtomicU64,
    refusals: AtomicU64,
    clears: AtomicU64,
}

/// Point-in-time copy of [`MetricsObserver`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocatorMetrics {
    /// Factories and instances stored for new keys
    pub registrations: u64,
    /// Factories and instances that overwrote an existing entry
    pub replacements: u64,
    /// Factories that ran and were cached
    pub materializations: u64,
    /// Lookups that returned nothing (unknown key or no factory)
    pub misses: u64,
    /// Nested lookups refused (cycle or depth)
    pub refusals: u64,
    /// Calls to `clear_instances`
    pub clears: u64,
}

impl MetricsObserver {
    /// Creates an observer with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads all counters.
    pub fn snapshot(&self) -> LocatorMetrics {
        LocatorMetrics {
            registrations: self.registrations.load(Ordering::Relaxed),
            replacements: self.replacements.load(Ordering::Relaxed),
            materializations: self.materializations.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            refusals: self.refusals.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }
}

impl LocatorObserver for MetricsObserver {
    fn observe(&self, event: &LocatorEvent) {
        let counter = match event {
            LocatorEvent::FactoryRegistered { .. } | LocatorEvent::InstanceRegistered { .. } => {
                &self.registrations
            }
            LocatorEvent::FactoryReplaced { .. } | LocatorEvent::InstanceReplaced { .. } => {
                &self.replacements
            }
            LocatorEvent::Materialized { .. } => &self.materializations,
            LocatorEvent::Missing { .. } | LocatorEvent::FactoryMissing { .. } => &self.misses,
            LocatorEvent::CycleRefused { .. } | LocatorEvent::DepthExceeded { .. } => {
                &self.refusals
            }
            LocatorEvent::Cleared { .. } => &self.clears,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
