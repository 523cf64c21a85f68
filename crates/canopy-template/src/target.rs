//! The materialization contract.
//!
//! A [`Target`] is where a component's compiled tree ends up: a browser
//! container in a real UI embedding, an in-memory buffer in tests and
//! headless runs. The runtime only needs the three capabilities below.

use crate::Element;
use std::fmt::Debug;

/// A container a component renders into.
pub trait Target: Debug {
    /// Drops the container's current content.
    fn empty(&self);
    /// Appends the element (a live handle, not a copy).
    fn append(&self, element: &Element);
    /// Adds a class token to the container itself.
    fn add_class(&self, class: &str);
}

/// In-memory target backed by a fragment element.
#[derive(Debug)]
pub struct MemoryTarget {
    root: Element,
}

impl MemoryTarget {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Element::fragment(),
        }
    }

    /// The live container element.
    #[must_use]
    pub fn root(&self) -> Element {
        self.root.clone()
    }

    /// Current content serialized to markup.
    #[must_use]
    pub fn markup(&self) -> String {
        self.root.to_markup()
    }
}

impl Default for MemoryTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for MemoryTarget {
    fn empty(&self) {
        self.root.empty();
    }

    fn append(&self, element: &Element) {
        self.root.append(element);
    }

    fn add_class(&self, class: &str) {
        self.root.add_class(class);
    }
}
