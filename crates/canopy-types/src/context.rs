//! Hierarchical context addresses.
//!
//! A context is a `/`-delimited path of opaque identifiers identifying a
//! component subtree on the event bus:
//!
//! ```text
//! <context> :: "<id>"  or  "<parentContext>/<id>"
//! ```
//!
//! The reserved root context is `"global"`. A component constructed with a
//! parent gets `<parentContext>/<uniqueId>`; a top-level component gets a
//! fresh single-segment context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved root context of the bus.
const GLOBAL: &str = "global";

/// Hierarchical address identifying a component subtree.
///
/// Contexts drive event routing: handlers subscribed at `"a/b"` are
/// reached by publishes at `"a/b"`, by bubbling from `"a/b/c"`, and by
/// propagation from `"a"`.
///
/// # Example
///
/// ```
/// use canopy_types::Context;
///
/// let root = Context::unique();
/// let child = root.child("item");
///
/// assert_eq!(child.parent(), Some(root.clone()));
/// assert!(child.as_str().starts_with(root.as_str()));
/// assert!(Context::global().is_global());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(String);

impl Context {
    /// Creates a context from a path. An empty path resolves to the
    /// global root.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        if path.is_empty() {
            Self(GLOBAL.to_string())
        } else {
            Self(path)
        }
    }

    /// Returns the reserved `"global"` root context.
    #[must_use]
    pub fn global() -> Self {
        Self(GLOBAL.to_string())
    }

    /// Creates a fresh single-segment context with a unique identifier.
    #[must_use]
    pub fn unique() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns a child context `<self>/<id>`.
    #[must_use]
    pub fn child(&self, id: impl AsRef<str>) -> Self {
        Self(format!("{}/{}", self.0, id.as_ref()))
    }

    /// Returns a child context with a fresh unique last segment.
    #[must_use]
    pub fn unique_child(&self) -> Self {
        self.child(Uuid::new_v4().simple().to_string())
    }

    /// Returns `true` if this is the reserved global root.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL
    }

    /// Returns the path segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns the parent context, or `None` for a single-segment path.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.rsplit_once('/').map(|(rest, _)| Self(rest.to_string()))
    }

    /// Returns the last path segment.
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Context {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Context {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_global() {
        assert_eq!(Context::new(""), Context::global());
        assert!(Context::new("").is_global());
    }

    #[test]
    fn child_and_parent() {
        let ctx = Context::new("a/b/c");
        assert_eq!(ctx.parent(), Some(Context::new("a/b")));
        assert_eq!(ctx.parent().and_then(|c| c.parent()), Some(Context::new("a")));
        assert_eq!(Context::new("a").parent(), None);
        assert_eq!(Context::new("a").child("b"), Context::new("a/b"));
    }

    #[test]
    fn segments_outermost_first() {
        let ctx = Context::new("a/b/c");
        let segs: Vec<&str> = ctx.segments().collect();
        assert_eq!(segs, vec!["a", "b", "c"]);
    }

    #[test]
    fn leaf_segment() {
        assert_eq!(Context::new("a/b/c").leaf(), "c");
        assert_eq!(Context::new("a").leaf(), "a");
    }

    #[test]
    fn unique_contexts_differ() {
        assert_ne!(Context::unique(), Context::unique());
        let base = Context::new("p");
        assert_ne!(base.unique_child(), base.unique_child());
    }

    #[test]
    fn global_has_no_special_parent() {
        // "global" is a normal single-segment path, just reserved.
        assert_eq!(Context::global().parent(), None);
    }
}
