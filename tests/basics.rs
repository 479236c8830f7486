use instance_locator::{InstanceLocator, Locate, LocatorError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Counter: Send + Sync {
    fn increment(&self) -> usize;
}

#[derive(Default)]
struct AtomicCounter {
    value: AtomicUsize,
}

impl Counter for AtomicCounter {
    fn increment(&self) -> usize {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }
}

trait Logger: Send + Sync {
    fn name(&self) -> &str;
}

struct NamedLogger(&'static str);

impl Logger for NamedLogger {
    fn name(&self) -> &str {
        self.0
    }
}

#[test]
fn test_factory_invoked_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let locator = InstanceLocator::new();
    locator.register_factory::<dyn Counter, _>(move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        Arc::new(AtomicCounter::default())
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!locator.is_materialized::<dyn Counter>());

    let first = locator.get_instance::<dyn Counter>().unwrap();
    let second = locator.get_instance::<dyn Counter>().unwrap();

    assert!(Arc::ptr_eq(&first, &second)); // Same instance
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.increment(), 1);
    assert_eq!(second.increment(), 2);
    assert!(locator.is_materialized::<dyn Counter>());
}

#[test]
fn test_instance_replaced() {
    let locator = InstanceLocator::new();
    let obj1: Arc<dyn Logger> = Arc::new(NamedLogger("obj1"));
    let obj2: Arc<dyn Logger> = Arc::new(NamedLogger("obj2"));

    locator.register_instance(obj1);
    locator.register_instance(obj2.clone());

    let resolved = locator.get_required::<dyn Logger>();
    assert_eq!(resolved.name(), "obj2");
    assert!(Arc::ptr_eq(&resolved, &obj2));
    assert_eq!(locator.total_instances(), 1);
}

#[test]
fn test_registered_instance_returned_without_factory() {
    let locator = InstanceLocator::new();
    let value = Arc::new("configured".to_string());
    locator.register_instance(value.clone());

    for _ in 0..3 {
        let resolved = locator.get_instance::<String>().unwrap();
        assert!(Arc::ptr_eq(&resolved, &value));
    }
    assert!(!locator.has_factory::<String>());
}

#[test]
fn test_unknown_key_returns_none() {
    struct Unregistered;

    let locator = InstanceLocator::new();
    locator.register(1u32);

    assert!(locator.get_instance::<Unregistered>().is_none());
    assert_eq!(locator.total_instances(), 1);
    assert!(!locator.contains::<Unregistered>());
    assert_eq!(
        locator.try_get::<Unregistered>().err(),
        Some(LocatorError::NotFound(std::any::type_name::<Unregistered>()))
    );
}

#[test]
fn test_factory_replaced_keeps_materialized_instance() {
    let locator = InstanceLocator::new();
    locator.register_factory::<String, _>(|| Arc::new("first".to_string()));

    let first = locator.get_required::<String>();
    locator.register_factory::<String, _>(|| Arc::new("second".to_string()));

    let after = locator.get_required::<String>();
    assert!(Arc::ptr_eq(&first, &after));
    assert_eq!(*after, "first");
    assert!(locator.has_factory::<String>());
    assert_eq!(locator.total_instances(), 1);
}

#[test]
fn test_factory_replaced_before_materialization() {
    let locator = InstanceLocator::new();
    locator.register_factory::<String, _>(|| Arc::new("first".to_string()));
    locator.register_factory::<String, _>(|| Arc::new("second".to_string()));

    assert_eq!(*locator.get_required::<String>(), "second");
}

#[test]
fn test_instance_then_factory_keeps_instance() {
    let locator = InstanceLocator::new();
    locator.register(5u8);
    locator.register_factory::<u8, _>(|| Arc::new(9u8));

    assert_eq!(*locator.get_required::<u8>(), 5);
    assert!(locator.has_factory::<u8>());
}

#[test]
fn test_instance_overrides_pending_factory() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let locator = InstanceLocator::new();
    locator.register_factory::<u16, _>(move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        Arc::new(1u16)
    });
    locator.register(2u16);

    assert_eq!(*locator.get_required::<u16>(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_clear_instances() {
    let locator = InstanceLocator::new();
    locator.register(1u32);
    locator.register_factory::<String, _>(|| Arc::new("lazy".to_string()));
    let _ = locator.get_instance::<String>();
    assert_eq!(locator.total_instances(), 2);

    locator.clear_instances();

    assert_eq!(locator.total_instances(), 0);
    assert!(locator.get_instance::<u32>().is_none());
    assert!(locator.get_instance::<String>().is_none());
    assert!(!locator.has_factory::<String>());

    // Still usable afterwards
    locator.register(2u32);
    assert_eq!(*locator.get_required::<u32>(), 2);
}

#[test]
fn test_replaced_factory_dropped_by_clear() {
    let locator = InstanceLocator::new();
    locator.register_factory::<String, _>(|| Arc::new("f1".to_string()));
    let _ = locator.get_required::<String>();
    locator.register_factory::<String, _>(|| Arc::new("f2".to_string()));

    locator.clear_instances();
    assert!(locator.get_instance::<String>().is_none());

    locator.register_factory::<String, _>(|| Arc::new("f3".to_string()));
    assert_eq!(*locator.get_required::<String>(), "f3");
}

#[test]
fn test_absent_arguments_rejected() {
    let locator = InstanceLocator::new();
    locator.register(7u64);

    let err = locator.try_register_instance::<dyn Logger>(None).unwrap_err();
    assert_eq!(err, LocatorError::InvalidArgument("instance"));

    let err = locator.try_register_factory::<dyn Logger>(None).unwrap_err();
    assert_eq!(err, LocatorError::InvalidArgument("factory"));

    assert_eq!(locator.total_instances(), 1);
    assert!(!locator.contains::<dyn Logger>());
}

#[test]
fn test_try_variants_accept_present_arguments() {
    let locator = InstanceLocator::new();

    locator
        .try_register_factory::<dyn Logger>(Some(Box::new(|| -> Arc<dyn Logger> {
            Arc::new(NamedLogger("boxed"))
        })))
        .unwrap();
    assert_eq!(locator.get_required::<dyn Logger>().name(), "boxed");

    let replacement: Arc<dyn Logger> = Arc::new(NamedLogger("explicit"));
    locator.try_register_instance(Some(replacement)).unwrap();
    assert_eq!(locator.get_required::<dyn Logger>().name(), "explicit");
}

#[test]
fn test_default_constructors() {
    #[derive(Default, Debug, PartialEq)]
    struct Settings {
        retries: u32,
    }

    #[derive(Default)]
    struct Cache {
        entries: Vec<String>,
    }

    let locator = InstanceLocator::new();
    locator.register_default_instance::<Settings>();
    locator.register_default_factory::<Cache>();

    assert!(locator.is_materialized::<Settings>());
    assert!(!locator.is_materialized::<Cache>());

    assert_eq!(*locator.get_required::<Settings>(), Settings { retries: 0 });
    assert!(locator.get_required::<Cache>().entries.is_empty());
    assert!(locator.is_materialized::<Cache>());
}

#[test]
fn test_get_cloned() {
    let locator = InstanceLocator::new();
    locator.register("hello".to_string());

    let owned: String = locator.get_cloned::<String>().unwrap();
    assert_eq!(owned, "hello");
    assert!(locator.get_cloned::<u8>().is_none());
}

#[test]
#[should_panic(expected = "Failed to locate")]
fn test_get_required_panics_when_missing() {
    let locator = InstanceLocator::new();
    let _ = locator.get_required::<dyn Logger>();
}

#[test]
fn test_concrete_and_contract_keys_are_distinct() {
    let locator = InstanceLocator::new();
    locator.register(AtomicCounter::default());
    locator.register_instance::<dyn Counter>(Arc::new(AtomicCounter::default()));

    let concrete = locator.get_required::<AtomicCounter>();
    let contract = locator.get_required::<dyn Counter>();
    concrete.increment();

    assert_eq!(contract.increment(), 1);
    assert_eq!(locator.total_instances(), 2);
}

#[test]
fn test_through_dyn_locate_core() {
    use instance_locator::LocateCore;

    fn resolve_title(locator: &dyn LocateCore) -> Option<Arc<String>> {
        locator.get_instance::<String>()
    }

    let locator = InstanceLocator::new();
    assert!(resolve_title(&locator).is_none());
    locator.register("Main window".to_string());
    assert_eq!(*resolve_title(&locator).unwrap(), "Main window");
}

#[test]
fn test_try_get_reports_mismatch_from_custom_store() {
    use instance_locator::{key_of, AnyArc, Key, LocateCore};
    use std::sync::Mutex;

    // Store that answers every lookup with the same `Arc<u8>`
    #[derive(Default)]
    struct ByteStore {
        mismatches: Mutex<Vec<Key>>,
    }

    impl LocateCore for ByteStore {
        fn locate_any(&self, _key: &Key) -> Option<AnyArc> {
            Some(Arc::new(Arc::new(7u8)))
        }

        fn report_mismatch(&self, key: &Key) {
            self.mismatches.lock().unwrap().push(*key);
        }
    }

    let store = ByteStore::default();
    assert_eq!(*store.try_get::<u8>().unwrap(), 7);
    assert_eq!(
        store.try_get::<u16>().err(),
        Some(LocatorError::TypeMismatch("u16"))
    );
    assert!(store.get_instance::<u16>().is_none());
    assert_eq!(*store.mismatches.lock().unwrap(), vec![key_of::<u16>(), key_of::<u16>()]);
}

#[test]
fn test_default_concrete_registered_under_contract() {
    let locator = InstanceLocator::new();
    locator.register_factory::<dyn Counter, _>(|| Arc::new(AtomicCounter::default()));

    assert_eq!(locator.get_required::<dyn Counter>().increment(), 1);
    assert!(!locator.contains::<AtomicCounter>());
}
