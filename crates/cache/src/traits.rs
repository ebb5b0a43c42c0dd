//! The contract between the cache manager and the objects it governs

use serde::Serialize;
use std::fmt;
use std::time::Instant;

/// Process-unique identity of a registered object
///
/// Ids are allocated monotonically and never reused, so a stale id cannot
/// alias a newer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GraphicId(pub(crate) u64);

impl GraphicId {
    /// Raw numeric value
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GraphicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque, sized, swappable resource tracked by the cache manager
///
/// The manager calls the query methods while holding its lock, so none of
/// them may call back into the manager. [`ManagedObject::swap_out`] is always
/// called with the lock released and may register or unregister other
/// objects. Dropping an object must not call into the manager either;
/// unregistration is driven by [`crate::Registration`].
pub trait ManagedObject: Send + Sync {
    /// Whether the payload is currently dematerialised
    fn is_swapped_out(&self) -> bool;

    /// Whether the object can currently report a meaningful size
    fn is_available(&self) -> bool;

    /// Current footprint in bytes, 0 when unavailable
    fn size_bytes(&self) -> i64;

    /// Dematerialise the payload
    ///
    /// May block and may re-enter the manager. Must be a no-op when already
    /// swapped out. Implementations report the freed size through
    /// [`crate::CacheManager::notify_swapped_out`].
    fn swap_out(&self);

    /// Last time the object was accessed
    fn last_used(&self) -> Instant;

    /// True while an external operation holds the object busy
    fn has_active_operation(&self) -> bool;
}

/// Size the manager may rely on: 0 when unavailable
pub(crate) fn graphic_size_bytes(object: &dyn ManagedObject) -> i64 {
    if !object.is_available() {
        return 0;
    }
    object.size_bytes()
}

/// Contribution of an object to the usage counter
pub(crate) fn accounted_size(object: &dyn ManagedObject) -> i64 {
    if object.is_swapped_out() {
        0
    } else {
        graphic_size_bytes(object)
    }
}
