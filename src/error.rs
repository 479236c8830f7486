//! Error types for the instance locator.

use std::fmt;

/// Instance locator errors
///
/// Lookups never fail the caller (they return `Option`), so these errors only
/// surface from the `try_*` entry points: registration calls handed an absent
/// factory or instance, and [`Locate::try_get`](crate::Locate::try_get) for
/// callers that want to know *why* a service is unavailable.
///
/// # Examples
///
/// ```rust
/// use instance_locator::{InstanceLocator, LocatorError};
///
/// trait Clock: Send + Sync {}
///
/// let locator = InstanceLocator::new();
/// let err = locator.try_register_instance::<dyn Clock>(None).unwrap_err();
/// assert_eq!(err, LocatorError::InvalidArgument("instance"));
/// assert_eq!(err.to_string(), "Invalid argument: instance must be provided");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// A required registration argument was absent (argument name)
    InvalidArgument(&'static str),
    /// No instance could be produced for the key (type name)
    NotFound(&'static str),
    /// Stored value could not be downcast to the requested type (type name)
    TypeMismatch(&'static str),
}

impl fmt::Display for LocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorError::InvalidArgument(name) => {
                write!(f, "Invalid argument: {} must be provided", name)
            }
            LocatorError::NotFound(name) => write!(f, "Instance not found: {}", name),
            LocatorError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
        }
    }
}

impl std::error::Error for LocatorError {}

/// Result type for locator operations
///
/// ```rust
/// use instance_locator::{LocatorResult, LocatorError};
///
/// fn lookup_port() -> LocatorResult<u16> {
///     Err(LocatorError::NotFound("u16"))
/// }
///
/// assert!(lookup_port().is_err());
/// ```
pub type LocatorResult<T> = Result<T, LocatorError>;
