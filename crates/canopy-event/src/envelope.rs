//! Publish envelopes.

use canopy_types::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_true() -> bool {
    true
}

/// A publish request: topic, originating context, payload, and routing
/// toggles.
///
/// The three toggles default to `true`:
///
/// | Field | When `true` |
/// |-------|-------------|
/// | `bubble` | ancestors of `context` are visited after the origin |
/// | `propagation` | descendants of `context` are visited, full depth |
/// | `global` | one extra dispatch happens at the `"global"` context |
///
/// Envelopes are immutable per publish call; the bus derives internal
/// copies when it recurses.
///
/// # Example
///
/// ```
/// use canopy_event::Envelope;
/// use canopy_types::Context;
/// use serde_json::json;
///
/// let env = Envelope::new("Stream.onUpdate", Context::new("page/stream"), json!({"items": 3}))
///     .with_bubble(false);
/// assert!(!env.bubble);
/// assert!(env.propagation && env.global);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name, namespaced by convention as `<ComponentName>.<eventName>`.
    pub topic: String,
    /// Context the event originates from.
    pub context: Context,
    /// Arbitrary payload handed to every handler.
    #[serde(default)]
    pub data: Value,
    /// Deliver to ancestor contexts after the origin.
    #[serde(default = "default_true")]
    pub bubble: bool,
    /// Deliver into descendant contexts after the origin.
    #[serde(default = "default_true")]
    pub propagation: bool,
    /// Fan out once to the `"global"` context.
    #[serde(default = "default_true")]
    pub global: bool,
}

impl Envelope {
    /// Creates an envelope with all routing toggles enabled.
    #[must_use]
    pub fn new(topic: impl Into<String>, context: Context, data: Value) -> Self {
        Self {
            topic: topic.into(),
            context,
            data,
            bubble: true,
            propagation: true,
            global: true,
        }
    }

    /// Sets the bubble toggle.
    #[must_use]
    pub fn with_bubble(mut self, bubble: bool) -> Self {
        self.bubble = bubble;
        self
    }

    /// Sets the propagation toggle.
    #[must_use]
    pub fn with_propagation(mut self, propagation: bool) -> Self {
        self.propagation = propagation;
        self
    }

    /// Sets the global fan-out toggle.
    #[must_use]
    pub fn with_global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }
}
