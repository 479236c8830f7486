#![no_main]

use libfuzzer_sys::fuzz_target;
use instance_locator::{InstanceLocator, Locate};
use std::sync::Arc;

trait TestTrait: Send + Sync {
    fn get_value(&self) -> u32;
}

struct TestServiceImpl {
    value: u32,
}

impl TestTrait for TestServiceImpl {
    fn get_value(&self) -> u32 {
        self.value
    }
}

// Drives a locator with byte-coded operations and checks it against a
// one-slot model for `u32` and `dyn TestTrait`.
fuzz_target!(|data: &[u8]| {
    let locator = InstanceLocator::new();
    let mut number: Option<u32> = None;
    let mut pending_number: Option<u32> = None;
    let mut contract: Option<u32> = None;

    for chunk in data.chunks(2) {
        let op = chunk[0] % 7;
        let arg = u32::from(*chunk.get(1).unwrap_or(&0));

        match op {
            0 => {
                locator.register(arg);
                number = Some(arg);
            }
            1 => {
                locator.register_factory::<u32, _>(move || Arc::new(arg));
                if number.is_none() {
                    pending_number = Some(arg);
                }
            }
            2 => {
                let resolved = locator.get_instance::<u32>().map(|v| *v);
                if number.is_none() {
                    number = pending_number;
                }
                assert_eq!(resolved, number);
            }
            3 => {
                locator.register_instance::<dyn TestTrait>(Arc::new(TestServiceImpl { value: arg }));
                contract = Some(arg);
            }
            4 => {
                let resolved = locator.get_instance::<dyn TestTrait>().map(|t| t.get_value());
                assert_eq!(resolved, contract);
            }
            5 => {
                locator.clear_instances();
                number = None;
                pending_number = None;
                contract = None;
            }
            _ => {
                let expected = usize::from(number.is_some() || pending_number.is_some())
                    + usize::from(contract.is_some());
                assert_eq!(locator.total_instances(), expected);
            }
        }
    }
});
