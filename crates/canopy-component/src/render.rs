//! Render delegation: compiling templates into live element trees.
//!
//! Four modes, selected by [`RenderArgs`]:
//!
//! | Mode | Selected by | Effect |
//! |------|-------------|--------|
//! | full | no `name` | clear tracked elements, compile, materialize, discover, notify |
//! | named single-level | `name` | fire that element's renderer chain only |
//! | named recursive | `name` + `recursive` | recompile the sub-template and replace the live node |
//! | stealth | `stealth` or explicit `target` | overlay render, no extensions, no notifications |
//!
//! Named elements are discovered by class token `<css-prefix><name>`;
//! discovery fires single-level rendering for each name depth-first in
//! tree order.

use crate::Component;
use canopy_template::{parse, resolve_path, substitute, Element, SubstitutionScope, Target, Template};
use serde_json::{json, Map, Value};
use std::rc::Rc;
use tracing::trace;

/// Arguments for one render pass.
#[derive(Clone, Default)]
pub struct RenderArgs {
    /// Named element to render; absent for a full render.
    pub name: Option<String>,
    /// Template override; defaults to the manifest's `"main"`.
    pub template: Option<Template>,
    /// Data override; defaults to the instance data.
    pub data: Option<Value>,
    /// Explicit destination. Setting it implies stealth.
    pub target: Option<Rc<dyn Target>>,
    pub recursive: bool,
    pub stealth: bool,
}

impl RenderArgs {
    /// Single-level render of a named element.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Recursive re-render of a named element's subtree.
    #[must_use]
    pub fn named_recursive(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            recursive: true,
            ..Self::default()
        }
    }
}

/// Placeholder resolver bound to one render pass.
///
/// Built-in instructions: `class`, `data`, `label`, `self`, `config`.
pub(crate) struct ComponentScope<'a> {
    component: &'a Component,
    data: Value,
}

impl ComponentScope<'_> {
    fn map_lookup(map: &Map<String, Value>, path: &str) -> Option<Value> {
        match path.split_once('.') {
            Some((first, rest)) => resolve_path(map.get(first)?, rest).cloned(),
            None => map.get(path).cloned(),
        }
    }
}

impl SubstitutionScope for ComponentScope<'_> {
    fn resolve(&self, instruction: &str, key: &str) -> Option<Value> {
        match instruction {
            "class" => Some(Value::String(format!(
                "{}{}",
                self.component.css_prefix(),
                key
            ))),
            "data" => resolve_path(&self.data, key).cloned(),
            "label" => self.component.label(key).map(Value::String),
            "self" => {
                let from_vars = Self::map_lookup(&self.component.state().vars, key);
                from_vars.or_else(|| resolve_path(&self.data, key).cloned())
            }
            "config" => match key {
                "appkey" => Some(Value::String(self.component.appkey())),
                "context" => Some(Value::String(self.component.context().as_str().to_string())),
                path => self.component.config_value(path),
            },
            _ => None,
        }
    }
}

impl Component {
    /// Full render with defaults. Shorthand for
    /// `render_with(RenderArgs::default())`.
    pub fn render(&self) -> Option<Element> {
        self.render_with(RenderArgs::default())
    }

    /// Runs one render pass. Returns the produced (or re-rendered)
    /// element, or `None` when the instance is inactive or the named
    /// element is unknown.
    pub fn render_with(&self, args: RenderArgs) -> Option<Element> {
        if !self.lifecycle().is_active() {
            return None;
        }
        if let Some(name) = args.name.clone() {
            if args.recursive {
                return self.render_element_recursive(&name, args.template, args.data);
            }
            return self.render_element(&name);
        }
        let stealth = args.stealth || args.target.is_some();
        self.render_full(args, stealth)
    }

    /// Substitutes placeholders against this instance. `data` defaults
    /// to the instance data.
    #[must_use]
    pub fn substitute(&self, template: &str, data: Option<&Value>) -> String {
        let scope = self.scope(data);
        substitute(template, &scope)
    }

    /// Delegates to the next-older renderer in the named element's
    /// chain, passing the same element through. Falls back to returning
    /// the untouched element once the chain is exhausted.
    pub fn parent_renderer(&self, name: &str, element: &Element) -> Element {
        let renderer = {
            let state = self.state();
            state
                .renderer_chains
                .get(name)
                .and_then(|chain| chain.advance())
                .cloned()
        };
        match renderer {
            Some(renderer) => renderer(self, element),
            None => element.clone(),
        }
    }

    fn scope(&self, data: Option<&Value>) -> ComponentScope<'_> {
        ComponentScope {
            component: self,
            data: data.cloned().unwrap_or_else(|| self.data()),
        }
    }

    /// Single-level render: fires the element's renderer chain from the
    /// top, without re-discovery.
    pub(crate) fn render_element(&self, name: &str) -> Option<Element> {
        let element = self.element(name)?;
        let renderer = {
            let state = self.state();
            state
                .renderer_chains
                .get(name)
                .and_then(|chain| chain.start())
                .cloned()
        };
        match renderer {
            Some(renderer) => Some(renderer(self, &element)),
            None => Some(element),
        }
    }

    /// Recursive re-render: recompile the named element's subtree from
    /// the main template, re-discover inside it, replace the live node.
    fn render_element_recursive(
        &self,
        name: &str,
        template: Option<Template>,
        data: Option<Value>,
    ) -> Option<Element> {
        let old = self.element(name)?;
        let tree = self.compile(template, data.as_ref(), true);
        let class = format!("{}{}", self.css_prefix(), name);
        let fresh = tree.find_by_class(&class).into_iter().next()?;
        self.discover_and_render(&fresh);
        let new = self.element(name).unwrap_or(fresh);
        old.replace_with(&new);
        Some(new)
    }

    fn render_full(&self, args: RenderArgs, stealth: bool) -> Option<Element> {
        let rendered_before = self.rendered();
        if !stealth {
            let mut state = self.state_mut();
            state.elements.clear();
            state.root = None;
        }

        let tree = self.compile(args.template, args.data.as_ref(), !stealth);
        if !stealth {
            self.state_mut().root = Some(tree.clone());
        }
        self.discover_and_render(&tree);

        let destination = args.target.or_else(|| self.target())?;
        destination.empty();
        destination.append(&tree);

        if !stealth {
            self.state_mut().rendered = true;
            let topics = if rendered_before {
                ["onRerender", "onRefresh"]
            } else {
                ["onRender", "onReady"]
            };
            for topic in topics {
                self.publish(topic, json!({}));
            }
        }
        Some(tree)
    }

    /// substitution, then parsing, then queued structural extensions.
    fn compile(&self, template: Option<Template>, data: Option<&Value>, extend: bool) -> Element {
        let template = template
            .or_else(|| self.manifest().templates.get("main").cloned())
            .unwrap_or_else(|| Template::from(""));
        let scope = self.scope(data);
        let markup = substitute(&template.realize(), &scope);
        let tree = parse(&markup);
        if extend {
            let extensions = self.state().template_extensions.clone();
            let prefix = self.css_prefix();
            for extension in &extensions {
                extension.apply(&tree, &prefix, &scope);
            }
        }
        tree
    }

    /// Registers every element carrying a `<prefix><name>` class token
    /// and fires single-level rendering for each, in document order.
    pub(crate) fn discover_and_render(&self, root: &Element) {
        let prefix = self.css_prefix();
        let mut order: Vec<String> = Vec::new();
        let mut nodes = vec![root.clone()];
        nodes.extend(root.descendants());
        for node in nodes {
            for class in node.classes() {
                let Some(name) = class.strip_prefix(&prefix) else {
                    continue;
                };
                if name.is_empty() {
                    continue;
                }
                if !order.iter().any(|existing| existing == name) {
                    order.push(name.to_string());
                }
                self.state_mut()
                    .elements
                    .insert(name.to_string(), node.clone());
            }
        }
        trace!(count = order.len(), "named elements discovered");
        for name in order {
            self.render_element(&name);
        }
    }
}
