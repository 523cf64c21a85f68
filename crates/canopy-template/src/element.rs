//! Shared-mutable markup element tree.
//!
//! [`Element`] is a cheap-to-clone handle (`Rc<RefCell<_>>`) onto one node
//! of the tree. Structural operations go through the handle so a node
//! discovered deep inside a compiled template can be re-rendered or
//! replaced in place while other handles keep observing the change.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Tag of the invisible multi-root wrapper produced by the parser.
const FRAGMENT_TAG: &str = "#fragment";

/// Elements that never carry children and serialize self-closed.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// One child slot of an element.
#[derive(Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

struct ElementData {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    children: Vec<Node>,
    parent: Weak<RefCell<ElementData>>,
}

/// Handle onto a markup tree node.
///
/// Cloning the handle clones the reference, not the node. Two handles
/// compare equal under [`Element::ptr_eq`] when they point at the same
/// node.
#[derive(Clone)]
pub struct Element(Rc<RefCell<ElementData>>);

impl Element {
    /// Creates a detached element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(ElementData {
            tag: tag.into(),
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
            parent: Weak::new(),
        })))
    }

    /// Creates an invisible multi-root container. Serializing a fragment
    /// emits only its children.
    #[must_use]
    pub fn fragment() -> Self {
        Self::new(FRAGMENT_TAG)
    }

    #[must_use]
    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    #[must_use]
    pub fn is_fragment(&self) -> bool {
        self.0.borrow().tag == FRAGMENT_TAG
    }

    /// Whether two handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // === attributes and classes ===

    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<String>) {
        self.0.borrow_mut().attrs.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        self.0.borrow().attrs.get(name).cloned()
    }

    pub fn add_class(&self, class: &str) {
        let mut data = self.0.borrow_mut();
        for token in class.split_whitespace() {
            if !data.classes.iter().any(|c| c == token) {
                data.classes.push(token.to_string());
            }
        }
    }

    pub fn remove_class(&self, class: &str) {
        self.0.borrow_mut().classes.retain(|c| c != class);
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.0.borrow().classes.iter().any(|c| c == class)
    }

    #[must_use]
    pub fn classes(&self) -> Vec<String> {
        self.0.borrow().classes.clone()
    }

    // === tree structure ===

    #[must_use]
    pub fn parent(&self) -> Option<Element> {
        self.0.borrow().parent.upgrade().map(Element)
    }

    /// Direct element children, skipping text nodes.
    #[must_use]
    pub fn child_elements(&self) -> Vec<Element> {
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Element(e) => Some(e.clone()),
                Node::Text(_) => None,
            })
            .collect()
    }

    #[must_use]
    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    /// Appends `child` as the last child, detaching it from any previous
    /// parent. Appending a node to itself is ignored.
    pub fn append(&self, child: &Element) {
        if self.ptr_eq(child) {
            return;
        }
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(Node::Element(child.clone()));
    }

    /// Inserts `child` as the first child.
    pub fn prepend(&self, child: &Element) {
        if self.ptr_eq(child) {
            return;
        }
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0
            .borrow_mut()
            .children
            .insert(0, Node::Element(child.clone()));
    }

    pub fn append_text(&self, text: impl Into<String>) {
        self.0.borrow_mut().children.push(Node::Text(text.into()));
    }

    /// Inserts `new` as the previous sibling of this node. No-op when
    /// this node is detached.
    pub fn insert_before(&self, new: &Element) {
        let Some(parent) = self.parent() else { return };
        let Some(pos) = parent.position_of(self) else {
            return;
        };
        new.detach();
        new.0.borrow_mut().parent = Rc::downgrade(&parent.0);
        parent
            .0
            .borrow_mut()
            .children
            .insert(pos, Node::Element(new.clone()));
    }

    /// Inserts `new` as the next sibling of this node.
    pub fn insert_after(&self, new: &Element) {
        let Some(parent) = self.parent() else { return };
        let Some(pos) = parent.position_of(self) else {
            return;
        };
        new.detach();
        new.0.borrow_mut().parent = Rc::downgrade(&parent.0);
        parent
            .0
            .borrow_mut()
            .children
            .insert(pos + 1, Node::Element(new.clone()));
    }

    /// Replaces this node with `new` in the live tree.
    pub fn replace_with(&self, new: &Element) {
        if self.ptr_eq(new) {
            return;
        }
        self.insert_before(new);
        self.detach();
    }

    /// Removes this node from its parent. Detached nodes stay usable.
    pub fn detach(&self) {
        let Some(parent) = self.parent() else { return };
        parent.0.borrow_mut().children.retain(|n| match n {
            Node::Element(e) => !e.ptr_eq(self),
            Node::Text(_) => true,
        });
        self.0.borrow_mut().parent = Weak::new();
    }

    /// Drops every child.
    pub fn empty(&self) {
        let children = self.child_elements();
        for child in children {
            child.0.borrow_mut().parent = Weak::new();
        }
        self.0.borrow_mut().children.clear();
    }

    fn position_of(&self, child: &Element) -> Option<usize> {
        self.0.borrow().children.iter().position(|n| match n {
            Node::Element(e) => e.ptr_eq(child),
            Node::Text(_) => false,
        })
    }

    // === queries ===

    /// Every descendant element (self excluded) in document order.
    #[must_use]
    pub fn descendants(&self) -> Vec<Element> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants(&self, out: &mut Vec<Element>) {
        for child in self.child_elements() {
            out.push(child.clone());
            child.collect_descendants(out);
        }
    }

    /// Descendants carrying the class token, document order, self
    /// included.
    #[must_use]
    pub fn find_by_class(&self, class: &str) -> Vec<Element> {
        let mut out = Vec::new();
        if self.has_class(class) {
            out.push(self.clone());
        }
        for el in self.descendants() {
            if el.has_class(class) {
                out.push(el);
            }
        }
        out
    }

    /// Concatenated text content of this subtree.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in self.0.borrow().children.iter() {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Replaces all children with a single text node.
    pub fn set_text(&self, text: impl Into<String>) {
        self.empty();
        self.append_text(text);
    }

    // === serialization ===

    /// Serializes the subtree back to markup.
    ///
    /// Deterministic: the `class` attribute comes first, remaining
    /// attributes in name order. Fragments emit children only.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        let data = self.0.borrow();
        if data.tag == FRAGMENT_TAG {
            drop(data);
            for node in self.children() {
                match node {
                    Node::Text(t) => out.push_str(&t),
                    Node::Element(e) => e.write_markup(out),
                }
            }
            return;
        }
        out.push('<');
        out.push_str(&data.tag);
        if !data.classes.is_empty() {
            out.push_str(" class=\"");
            out.push_str(&data.classes.join(" "));
            out.push('"');
        }
        for (name, value) in &data.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(value);
            out.push('"');
        }
        let void = VOID_TAGS.contains(&data.tag.as_str());
        if void && data.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        let tag = data.tag.clone();
        drop(data);
        for node in self.children() {
            match node {
                Node::Text(t) => out.push_str(&t),
                Node::Element(e) => e.write_markup(out),
            }
        }
        out.push_str("</");
        out.push_str(&tag);
        out.push('>');
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Element")
            .field("tag", &data.tag)
            .field("classes", &data.classes)
            .field("children", &data.children.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_sets_parent_and_order() {
        let root = Element::new("div");
        let a = Element::new("span");
        let b = Element::new("span");
        root.append(&a);
        root.append(&b);
        assert!(a.parent().is_some_and(|p| p.ptr_eq(&root)));
        let children = root.child_elements();
        assert!(children[0].ptr_eq(&a));
        assert!(children[1].ptr_eq(&b));
    }

    #[test]
    fn append_reparents() {
        let first = Element::new("div");
        let second = Element::new("div");
        let child = Element::new("span");
        first.append(&child);
        second.append(&child);
        assert!(first.child_elements().is_empty());
        assert!(child.parent().is_some_and(|p| p.ptr_eq(&second)));
    }

    #[test]
    fn insert_before_and_after_keep_order() {
        let root = Element::new("div");
        let mid = Element::new("b");
        root.append(&mid);
        let before = Element::new("a");
        let after = Element::new("c");
        mid.insert_before(&before);
        mid.insert_after(&after);
        let tags: Vec<String> = root.child_elements().iter().map(Element::tag).collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn replace_with_swaps_node_in_place() {
        let root = Element::new("div");
        let old = Element::new("span");
        root.append(&old);
        let new = Element::new("p");
        old.replace_with(&new);
        assert!(old.parent().is_none());
        let children = root.child_elements();
        assert_eq!(children.len(), 1);
        assert!(children[0].ptr_eq(&new));
    }

    #[test]
    fn find_by_class_is_document_order() {
        let root = Element::new("div");
        root.add_class("hit");
        let inner = Element::new("section");
        let deep = Element::new("span");
        deep.add_class("hit");
        let late = Element::new("span");
        late.add_class("hit");
        inner.append(&deep);
        root.append(&inner);
        root.append(&late);
        let hits = root.find_by_class("hit");
        assert_eq!(hits.len(), 3);
        assert!(hits[0].ptr_eq(&root));
        assert!(hits[1].ptr_eq(&deep));
        assert!(hits[2].ptr_eq(&late));
    }

    #[test]
    fn add_class_deduplicates_tokens() {
        let el = Element::new("div");
        el.add_class("a b");
        el.add_class("b c");
        assert_eq!(el.classes(), vec!["a", "b", "c"]);
    }

    #[test]
    fn markup_is_deterministic() {
        let el = Element::new("div");
        el.set_attr("id", "x");
        el.set_attr("data-role", "panel");
        el.add_class("one two");
        el.append_text("hi");
        assert_eq!(
            el.to_markup(),
            "<div class=\"one two\" data-role=\"panel\" id=\"x\">hi</div>"
        );
    }

    #[test]
    fn void_elements_self_close() {
        let el = Element::new("br");
        assert_eq!(el.to_markup(), "<br/>");
    }

    #[test]
    fn fragment_serializes_children_only() {
        let frag = Element::fragment();
        frag.append(&Element::new("i"));
        frag.append_text("x");
        assert_eq!(frag.to_markup(), "<i></i>x");
    }

    #[test]
    fn set_text_replaces_subtree() {
        let el = Element::new("div");
        el.append(&Element::new("span"));
        el.set_text("plain");
        assert!(el.child_elements().is_empty());
        assert_eq!(el.text(), "plain");
    }
}
