//! # instance-locator
//!
//! Thread-safe, lazily-populated instance locator for application composition roots.
//!
//! ## Features
//!
//! - **Capability keys**: instances are addressed by type, including `dyn Trait` contracts
//! - **Lazy materialization**: factories run on first lookup, at most once per registration
//! - **Thread-safe**: one lock guards registration, lookup and clearing together
//! - **Best-effort lookup**: a missing service yields `None` plus a logged warning, never an error
//! - **Re-entrant factories**: a factory may resolve other services; cycles are refused
//! - **Observable**: every event goes to `tracing` and to attached observers
//!
//! ## Quick Start
//!
//! ```rust
//! use instance_locator::{InstanceLocator, Locate};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) {
//!         println!("[LOG] {}", message);
//!     }
//! }
//!
//! struct Settings {
//!     title: String,
//! }
//!
//! // Composition root
//! let locator = InstanceLocator::new();
//! locator.register_instance::<dyn Logger>(Arc::new(ConsoleLogger));
//! locator.register_factory::<Settings, _>(|| Arc::new(Settings { title: "Main".to_string() }));
//!
//! // Application code
//! let logger = locator.get_required::<dyn Logger>();
//! let settings = locator.get_instance::<Settings>().unwrap();
//! logger.log(&settings.title);
//!
//! // Unknown services degrade to None
//! assert!(locator.get_instance::<u64>().is_none());
//! ```
//!
//! ## Process-wide locator
//!
//! [`InstanceLocator::current`] returns a lazily created locator shared by the
//! whole process. Prefer passing an explicitly built locator (or a
//! `&dyn LocateCore`) to the code that needs it; the process-wide one is for
//! composition roots that cannot thread a reference through.
//!
//! ```rust
//! use instance_locator::{InstanceLocator, Locate};
//!
//! #[derive(Default)]
//! struct Clipboard;
//!
//! let locator = InstanceLocator::current();
//! locator.register_default_factory::<Clipboard>();
//! assert!(locator.get_instance::<Clipboard>().is_some());
//! ```

// Module declarations
pub mod error;
pub mod key;
pub mod locator;
pub mod observer;
pub mod traits;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use error::{LocatorError, LocatorResult};
pub use key::{key_of, Key};
pub use locator::{InstanceLocator, LocatorBuilder};
pub use observer::{LocatorEvent, LocatorMetrics, LocatorObserver, MetricsObserver};
pub use registration::{AnyArc, Factory};
pub use traits::{Locate, LocateCore};
