//! Service key types for the instance locator.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Key for instance storage and lookup.
///
/// A key identifies one capability contract in the locator. It is built from
/// the `TypeId` of the requested type, which may be unsized, so `dyn Trait`
/// works as a key just like a concrete struct. The type name is carried along
/// for log lines and error messages only.
///
/// # Examples
///
/// ```rust
/// use instance_locator::{Key, key_of};
///
/// trait Logger: Send + Sync {}
///
/// let concrete = key_of::<String>();
/// let contract = key_of::<dyn Logger>();
///
/// assert_eq!(concrete.display_name(), "alloc::string::String");
/// assert!(contract.display_name().contains("Logger"));
/// assert_ne!(concrete, contract);
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Builds a key from its raw parts.
    ///
    /// Prefer [`key_of`]; this exists for callers that already hold a `TypeId`.
    pub fn new(id: TypeId, name: &'static str) -> Self {
        Self { id, name }
    }

    /// Get the type name for display
    ///
    /// Returns the `std::any::type_name` of the keyed type.
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    /// The `TypeId` this key is addressed by.
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

// Identity is the TypeId alone; the name is diagnostic
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Creates the key addressing `K`.
#[inline(always)]
pub fn key_of<K: ?Sized + 'static>() -> Key {
    Key::new(TypeId::of::<K>(), std::any::type_name::<K>())
}
