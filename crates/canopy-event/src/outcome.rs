//! Handler return values.
//!
//! Buses of this kind often inspect loosely-typed return values for
//! stop tokens; Canopy carries the stop set as an explicit struct so
//! the compiler keeps publishers and handlers honest.

/// Result of a handler invocation, carrying propagation stop flags.
///
/// The default outcome continues everything. Flags may combine:
///
/// ```
/// use canopy_event::HandlerOutcome;
///
/// let outcome = HandlerOutcome::stop_bubble().and_stop_children();
/// assert!(outcome.stop_bubble);
/// assert!(outcome.stop_children);
/// assert!(!outcome.stop_siblings);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerOutcome {
    /// Suppress delivery to ancestor contexts for this publish.
    pub stop_bubble: bool,
    /// Suppress delivery into descendant contexts for this publish.
    pub stop_children: bool,
    /// Suppress the remaining handlers at the current context node.
    pub stop_siblings: bool,
}

impl HandlerOutcome {
    /// Continue bubbling, propagation, and sibling iteration.
    #[must_use]
    pub fn proceed() -> Self {
        Self::default()
    }

    /// Stop delivery to ancestor contexts.
    #[must_use]
    pub fn stop_bubble() -> Self {
        Self {
            stop_bubble: true,
            ..Self::default()
        }
    }

    /// Stop delivery into descendant contexts.
    #[must_use]
    pub fn stop_children() -> Self {
        Self {
            stop_children: true,
            ..Self::default()
        }
    }

    /// Stop the remaining handlers at the current node.
    #[must_use]
    pub fn stop_siblings() -> Self {
        Self {
            stop_siblings: true,
            ..Self::default()
        }
    }

    /// Stop everything: bubbling, propagation, and sibling iteration.
    #[must_use]
    pub fn stop_all() -> Self {
        Self {
            stop_bubble: true,
            stop_children: true,
            stop_siblings: true,
        }
    }

    /// Adds the bubble-stop flag.
    #[must_use]
    pub fn and_stop_bubble(mut self) -> Self {
        self.stop_bubble = true;
        self
    }

    /// Adds the children-stop flag.
    #[must_use]
    pub fn and_stop_children(mut self) -> Self {
        self.stop_children = true;
        self
    }

    /// Adds the siblings-stop flag.
    #[must_use]
    pub fn and_stop_siblings(mut self) -> Self {
        self.stop_siblings = true;
        self
    }
}
