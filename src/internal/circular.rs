//! Re-entrant materialization tracking.
//!
//! The locator lock is re-entrant, so a factory may look up other services
//! while it runs. A thread-local stack of in-flight keys catches factories
//! that end up asking for their own key.

use std::cell::RefCell;

use crate::key::Key;

pub(crate) const DEFAULT_MAX_DEPTH: usize = 1024;

// (locator address, key) pairs currently being materialized on this thread
#[cfg(feature = "smallvec")]
type Stack = smallvec::SmallVec<[(usize, Key); 8]>;
#[cfg(not(feature = "smallvec"))]
type Stack = Vec<(usize, Key)>;

thread_local! {
    static MATERIALIZING: RefCell<Stack> = RefCell::new(Stack::new());
}

/// Why a materialization frame could not be entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Refusal {
    /// The key is already being materialized further up; full path included
    Cycle(Vec<&'static str>),
    /// Nesting reached the configured limit
    TooDeep(usize),
}

/// Guard for one in-flight materialization on the current thread.
pub(crate) struct MaterializeFrame {
    owner: usize,
    key: Key,
}

impl MaterializeFrame {
    /// Pushes `key` for `owner`, refusing cycles and excessive depth.
    pub(crate) fn enter(owner: usize, key: Key, max_depth: usize) -> Result<Self, Refusal> {
        MATERIALIZING.with(|stack| {
            let mut stack = stack.borrow_mut();

            // Cycle check BEFORE pushing, scoped to the same locator
            if stack.iter().any(|&(o, k)| o == owner && k == key) {
                let mut path: Vec<&'static str> = stack
                    .iter()
                    .filter(|(o, _)| *o == owner)
                    .map(|(_, k)| k.display_name())
                    .collect();
                path.push(key.display_name());
                return Err(Refusal::Cycle(path));
            }

            if stack.len() >= max_depth {
                return Err(Refusal::TooDeep(stack.len()));
            }

            stack.push((owner, key));
            Ok(Self { owner, key })
        })
    }
}

impl Drop for MaterializeFrame {
    fn drop(&mut self) {
        MATERIALIZING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(last) = stack.pop() {
                debug_assert!(last.0 == self.owner && last.1 == self.key);
            }
        });
    }
}
