//! Structural template extensions.
//!
//! Extensions let a plugin alter a component's compiled markup without
//! touching the original template: each queued extension targets a named
//! element (by its css-prefix class token) and inserts, replaces, or
//! removes nodes around it. Extensions apply in registration order,
//! after substitution, before the tree is handed to the target.

use crate::{parse, substitute, Element, SubstitutionScope, Template};
use tracing::{debug, warn};

/// Where an extension's markup lands relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionAction {
    InsertBefore,
    InsertAfter,
    InsertAsFirstChild,
    InsertAsLastChild,
    Replace,
    Remove,
}

/// One queued structural transformation.
#[derive(Debug, Clone)]
pub struct TemplateExtension {
    pub action: ExtensionAction,
    /// Named-element id the extension anchors on.
    pub anchor: String,
    /// Markup to insert. Required for every action except `Remove`;
    /// passes through substitution when applied.
    pub html: Option<Template>,
}

impl TemplateExtension {
    #[must_use]
    pub fn new(
        action: ExtensionAction,
        anchor: impl Into<String>,
        html: impl Into<Template>,
    ) -> Self {
        Self {
            action,
            anchor: anchor.into(),
            html: Some(html.into()),
        }
    }

    /// A `Remove` extension carries no markup.
    #[must_use]
    pub fn remove(anchor: impl Into<String>) -> Self {
        Self {
            action: ExtensionAction::Remove,
            anchor: anchor.into(),
            html: None,
        }
    }

    /// Applies the extension inside `root`. The anchor is the first
    /// element classed `<prefix><anchor>`; a missing anchor skips the
    /// extension.
    pub fn apply(&self, root: &Element, prefix: &str, scope: &dyn SubstitutionScope) {
        let class = format!("{prefix}{}", self.anchor);
        let Some(anchor) = root.find_by_class(&class).into_iter().next() else {
            debug!(anchor = %self.anchor, "extension anchor not found, skipped");
            return;
        };
        if self.action == ExtensionAction::Remove {
            anchor.detach();
            return;
        }
        let Some(html) = &self.html else {
            warn!(anchor = %self.anchor, action = ?self.action, "extension without markup skipped");
            return;
        };
        let new_nodes = parse(&substitute(&html.realize(), scope)).child_elements();
        match self.action {
            ExtensionAction::InsertBefore => {
                for node in &new_nodes {
                    anchor.insert_before(node);
                }
            }
            ExtensionAction::InsertAfter => {
                for node in new_nodes.iter().rev() {
                    anchor.insert_after(node);
                }
            }
            ExtensionAction::InsertAsFirstChild => {
                for node in new_nodes.iter().rev() {
                    anchor.prepend(node);
                }
            }
            ExtensionAction::InsertAsLastChild => {
                for node in &new_nodes {
                    anchor.append(node);
                }
            }
            ExtensionAction::Replace => {
                for node in &new_nodes {
                    anchor.insert_before(node);
                }
                anchor.detach();
            }
            // handled by the early return above
            ExtensionAction::Remove => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EmptyScope;

    fn tree() -> Element {
        parse("<div><span class=\"pfx-title\">T</span></div>")
    }

    #[test]
    fn insert_before_and_after_surround_anchor() {
        let root = tree();
        TemplateExtension::new(ExtensionAction::InsertBefore, "title", "<a></a>")
            .apply(&root, "pfx-", &EmptyScope);
        TemplateExtension::new(ExtensionAction::InsertAfter, "title", "<b></b><c></c>")
            .apply(&root, "pfx-", &EmptyScope);
        let tags: Vec<String> = root.child_elements()[0]
            .child_elements()
            .iter()
            .map(Element::tag)
            .collect();
        assert_eq!(tags, vec!["a", "span", "b", "c"]);
    }

    #[test]
    fn child_insertions_preserve_markup_order() {
        let root = tree();
        TemplateExtension::new(ExtensionAction::InsertAsFirstChild, "title", "<i></i><u></u>")
            .apply(&root, "pfx-", &EmptyScope);
        TemplateExtension::new(ExtensionAction::InsertAsLastChild, "title", "<q></q>")
            .apply(&root, "pfx-", &EmptyScope);
        let anchor = &root.find_by_class("pfx-title")[0];
        let tags: Vec<String> = anchor.child_elements().iter().map(Element::tag).collect();
        assert_eq!(tags, vec!["i", "u", "q"]);
        assert_eq!(anchor.text(), "T");
    }

    #[test]
    fn replace_swaps_anchor_out() {
        let root = tree();
        TemplateExtension::new(ExtensionAction::Replace, "title", "<p>new</p>")
            .apply(&root, "pfx-", &EmptyScope);
        assert!(root.find_by_class("pfx-title").is_empty());
        assert_eq!(root.text(), "new");
    }

    #[test]
    fn remove_detaches_anchor() {
        let root = tree();
        TemplateExtension::remove("title").apply(&root, "pfx-", &EmptyScope);
        assert!(root.child_elements()[0].child_elements().is_empty());
    }

    #[test]
    fn missing_anchor_is_skipped() {
        let root = tree();
        let before = root.to_markup();
        TemplateExtension::new(ExtensionAction::Replace, "ghost", "<p></p>")
            .apply(&root, "pfx-", &EmptyScope);
        assert_eq!(root.to_markup(), before);
    }
}
