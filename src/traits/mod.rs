//! Core traits for the instance locator.

mod locate;

pub use locate::{Locate, LocateCore};
