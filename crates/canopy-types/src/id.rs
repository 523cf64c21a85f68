//! Identifier types for Canopy.
//!
//! All identifiers are UUID-based so that subscriptions created by
//! independent components can never collide.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a single event-bus subscription.
///
/// Returned by `subscribe` and required for targeted unsubscription.
/// A `HandlerId` maps to at most one live subscription; once removed,
/// unsubscribing it again reports `false` rather than failing.
///
/// # Example
///
/// ```
/// use canopy_types::HandlerId;
///
/// let a = HandlerId::new();
/// let b = HandlerId::new();
/// assert_ne!(a, b); // each subscription is unique
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerId(pub Uuid);

#[allow(clippy::new_without_default)] // Default intentionally not implemented - see below
impl HandlerId {
    /// Creates a new [`HandlerId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

// NOTE: HandlerId intentionally does NOT implement Default.
// Default::default() would produce an id that is not registered with any
// bus, leading to subtle bugs. Ids are handed out by subscribe only.

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler:{}", self.0)
    }
}
