//! Component manifests.
//!
//! A manifest is the construction-time record a widget author supplies:
//! name, default vars and config, labels, event bindings, methods,
//! renderers, templates, lifecycle hooks and css. Component "classes"
//! are data-driven manifests composed with the fixed lifecycle
//! executor, not type hierarchies.

use crate::config::Normalizer;
use crate::Component;
use canopy_event::HandlerOutcome;
use canopy_template::{Element, Template};
use canopy_types::Context;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// Renderer function for one named element. Receives the element's
/// current node; returns the node to register (usually the same one).
pub type RendererFn = Rc<dyn Fn(&Component, &Element) -> Element>;

/// A manifest-declared method, invocable via [`Component::invoke`].
pub type MethodFn = Rc<dyn Fn(&Component, &Value) -> Value>;

/// Event handler bound to the component instance.
pub type EventHandler = Rc<dyn Fn(&Component, &str, &Value) -> HandlerOutcome>;

/// One manifest-declared event subscription.
#[derive(Clone)]
pub struct EventBinding {
    /// Full topic name, not auto-prefixed.
    pub topic: String,
    pub handler: EventHandler,
    /// Defaults to the component's own context.
    pub context: Option<Context>,
    pub once: bool,
}

impl EventBinding {
    #[must_use]
    pub fn new(topic: impl Into<String>, handler: EventHandler) -> Self {
        Self {
            topic: topic.into(),
            handler,
            context: None,
            once: false,
        }
    }

    #[must_use]
    pub fn at(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

impl fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding")
            .field("topic", &self.topic)
            .field("context", &self.context)
            .field("once", &self.once)
            .finish()
    }
}

/// A widget's construction-time declaration.
#[derive(Clone)]
pub struct Manifest {
    pub name: String,
    /// Default instance vars, reset on every vars phase.
    pub vars: Map<String, Value>,
    /// Default widget-specific config values.
    pub config: Map<String, Value>,
    /// Per-key normalizers applied to the merged config values.
    pub normalizers: HashMap<String, Normalizer>,
    pub labels: BTreeMap<String, String>,
    pub events: Vec<EventBinding>,
    pub methods: HashMap<String, MethodFn>,
    /// Renderers registered at the renderers phase, in order.
    pub renderers: Vec<(String, RendererFn)>,
    /// Named templates; `"main"` is the default render template.
    pub templates: HashMap<String, Template>,
    /// Runs once the plugins phase completes. Default: full render.
    pub init: Rc<dyn Fn(&Component)>,
    /// Instance teardown hook, receives the destroy event data.
    pub destroy: Option<Rc<dyn Fn(&Component, &Value)>>,
    /// Normalization hook applied to every published event's data.
    pub prepare_event: Option<Rc<dyn Fn(&Component, Value) -> Value>>,
    pub css: Option<String>,
}

impl Manifest {
    /// The common empty manifest. The default init hook performs a full
    /// render.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Map::new(),
            config: Map::new(),
            normalizers: HashMap::new(),
            labels: BTreeMap::new(),
            events: Vec::new(),
            methods: HashMap::new(),
            renderers: Vec::new(),
            templates: HashMap::new(),
            init: Rc::new(|component| {
                component.render();
            }),
            destroy: None,
            prepare_event: None,
            css: None,
        }
    }

    /// Derived css class prefix: the lowercased name with `-` removed
    /// and `.` turned into `-`, plus a trailing `-`.
    #[must_use]
    pub fn css_prefix(&self) -> String {
        let mut prefix = self.name.to_lowercase().replace('-', "").replace('.', "-");
        prefix.push('-');
        prefix
    }

    #[must_use]
    pub fn main_template(mut self, template: impl Into<Template>) -> Self {
        self.templates.insert("main".to_string(), template.into());
        self
    }

    #[must_use]
    pub fn with_template(mut self, name: impl Into<String>, template: impl Into<Template>) -> Self {
        self.templates.insert(name.into(), template.into());
        self
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: Value) -> Self {
        self.vars.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_config_default(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_normalizer(mut self, key: impl Into<String>, normalizer: Normalizer) -> Self {
        self.normalizers.insert(key.into(), normalizer);
        self
    }

    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_event(mut self, binding: EventBinding) -> Self {
        self.events.push(binding);
        self
    }

    #[must_use]
    pub fn with_method(mut self, name: impl Into<String>, method: MethodFn) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    #[must_use]
    pub fn with_renderer(mut self, name: impl Into<String>, renderer: RendererFn) -> Self {
        self.renderers.push((name.into(), renderer));
        self
    }

    #[must_use]
    pub fn with_init(mut self, init: Rc<dyn Fn(&Component)>) -> Self {
        self.init = init;
        self
    }

    #[must_use]
    pub fn with_destroy(mut self, destroy: Rc<dyn Fn(&Component, &Value)>) -> Self {
        self.destroy = Some(destroy);
        self
    }

    #[must_use]
    pub fn with_prepare_event(mut self, hook: Rc<dyn Fn(&Component, Value) -> Value>) -> Self {
        self.prepare_event = Some(hook);
        self
    }

    #[must_use]
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }
}

impl fmt::Debug for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manifest")
            .field("name", &self.name)
            .field("events", &self.events.len())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("templates", &self.templates.keys().collect::<Vec<_>>())
            .finish()
    }
}
