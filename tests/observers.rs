use instance_locator::{
    key_of, InstanceLocator, Locate, LocatorEvent, LocatorMetrics, LocatorObserver, MetricsObserver,
};
use std::sync::{Arc, Mutex, Weak};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<LocatorEvent>>,
}

impl Recorder {
    fn lines(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().map(ToString::to_string).collect()
    }
}

impl LocatorObserver for Recorder {
    fn observe(&self, event: &LocatorEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("instance_locator=debug")
        .with_test_writer()
        .try_init();
}

trait Logger: Send + Sync {}
struct NullLogger;
impl Logger for NullLogger {}

#[test]
fn test_event_sequence() {
    init_tracing();

    let recorder = Arc::new(Recorder::default());
    let locator = InstanceLocator::builder().observer(recorder.clone()).build();

    locator.register_factory::<String, _>(|| Arc::new("lazy".to_string()));
    locator.register_factory::<String, _>(|| Arc::new("lazier".to_string()));
    let _ = locator.get_instance::<String>();
    let _ = locator.get_instance::<String>();
    locator.register_instance::<dyn Logger>(Arc::new(NullLogger));
    let _ = locator.get_instance::<u16>();
    locator.clear_instances();

    let events = recorder.events.lock().unwrap();
    let string_key = key_of::<String>();
    assert_eq!(events[0], LocatorEvent::FactoryRegistered { key: string_key });
    assert_eq!(events[1], LocatorEvent::FactoryReplaced { key: string_key });
    assert!(matches!(events[2], LocatorEvent::Materialized { key, .. } if key == string_key));
    // Cached lookups are silent
    assert_eq!(events[3], LocatorEvent::InstanceRegistered { key: key_of::<dyn Logger>() });
    assert_eq!(events[4], LocatorEvent::Missing { key: key_of::<u16>() });
    assert_eq!(events[5], LocatorEvent::Cleared { entries: 2 });
    assert_eq!(events.len(), 6);
}

#[test]
fn test_event_lines_match_log_messages() {
    init_tracing();

    let recorder = Arc::new(Recorder::default());
    let locator = InstanceLocator::builder().observer(recorder.clone()).build();

    locator.register(1u8);
    locator.register(2u8);
    let _ = locator.get_instance::<u16>();
    locator.clear_instances();

    assert_eq!(
        recorder.lines(),
        vec![
            "instance of [u8] registered",
            "instance of [u8] replaced",
            "interface not found: [u16]",
            "locator cleared (1 entries)",
        ]
    );
}

#[test]
fn test_metrics_observer_counts() {
    let metrics = Arc::new(MetricsObserver::new());
    let locator = InstanceLocator::builder().observer(metrics.clone()).build();

    locator.register(1u32);
    locator.register(2u32);
    locator.register_default_factory::<String>();
    let _ = locator.get_instance::<String>();
    let _ = locator.get_instance::<String>();
    let _ = locator.get_instance::<u64>();
    locator.clear_instances();

    assert_eq!(
        metrics.snapshot(),
        LocatorMetrics {
            registrations: 2,
            replacements: 1,
            materializations: 1,
            misses: 1,
            refusals: 0,
            clears: 1,
        }
    );
}

#[test]
fn test_observer_added_at_runtime() {
    let locator = InstanceLocator::new();
    locator.register(1u8);

    let recorder = Arc::new(Recorder::default());
    locator.add_observer(recorder.clone());
    locator.register(2u8);

    assert_eq!(recorder.lines(), vec!["instance of [u8] replaced"]);
}

#[test]
fn test_observer_may_call_back_into_locator() {
    // Counts entries every time something is registered
    struct EntryCounter {
        locator: Mutex<Weak<InstanceLocator>>,
        seen: Mutex<Vec<usize>>,
    }

    impl LocatorObserver for EntryCounter {
        fn observe(&self, event: &LocatorEvent) {
            if let LocatorEvent::InstanceRegistered { .. } = event {
                if let Some(locator) = self.locator.lock().unwrap().upgrade() {
                    self.seen.lock().unwrap().push(locator.total_instances());
                }
            }
        }
    }

    let counter = Arc::new(EntryCounter {
        locator: Mutex::new(Weak::new()),
        seen: Mutex::new(Vec::new()),
    });
    let locator = Arc::new(InstanceLocator::builder().observer(counter.clone()).build());
    *counter.locator.lock().unwrap() = Arc::downgrade(&locator);

    locator.register(1u8);
    locator.register(1u16);
    locator.register(1u32);

    assert_eq!(*counter.seen.lock().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_cleared_factory_reported_as_missing() {
    init_tracing();

    let recorder = Arc::new(Recorder::default());
    let locator = InstanceLocator::builder().observer(recorder.clone()).build();

    // Clearing drops the factory together with its entry
    locator.register_factory::<u8, _>(|| Arc::new(1));
    locator.clear_instances();
    assert!(locator.get_instance::<u8>().is_none());

    let lines = recorder.lines();
    assert_eq!(lines.last().map(String::as_str), Some("interface not found: [u8]"));
}
