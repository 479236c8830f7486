//! Internal implementation details.

pub(crate) mod circular;

pub(crate) use circular::{MaterializeFrame, Refusal, DEFAULT_MAX_DEPTH};
