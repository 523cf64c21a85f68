//! The component instance and its lifecycle executor.
//!
//! A [`Component`] is a cheap-to-clone handle (`Rc` inner) onto one
//! widget instance. Construction runs the phased initialization
//! sequence; external events arriving through the bus drive re-render
//! or teardown afterwards.
//!
//! # Phases
//!
//! ```text
//! create ──▶ vars → extension → config → events → subscriptions
//!            → labels → css → renderers → dom → loading
//!            → [user gate] → plugins → manifest.init
//! ```
//!
//! The user gate is the only suspension point: with a pre-resolved user
//! in config the whole sequence completes inside `create`; otherwise
//! the remaining phases run inside the session collaborator's ready
//! callback.

use crate::collaborators::{DataRequest, Plugin, Services, TimerHandle};
use crate::config::{ComponentConfig, Enabled, PluginEntry, ResolvedConfig};
use crate::error::ComponentError;
use crate::labels::Labels;
use crate::lifecycle::{Lifecycle, Phase};
use crate::manifest::{EventBinding, EventHandler, Manifest, RendererFn};
use canopy_event::{Envelope, EventBus, HandlerOutcome};
use canopy_template::{Element, RendererChain, Target, TemplateExtension};
use canopy_types::{Context, HandlerId};
use serde_json::{json, Map, Value};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// Topic every component's destroy handler listens on.
pub const DESTROY_TOPIC: &str = "Component.onDestroy";

/// External notification that active data went stale.
pub const DATA_INVALIDATE_TOPIC: &str = "Component.onDataInvalidate";

/// Published at the global context when the user session changes;
/// top-level components refresh in response.
pub const SESSION_INVALIDATE_TOPIC: &str = "UserSession.onInvalidate";

/// Mutable per-instance state. Never borrowed across a handler or
/// collaborator invocation.
pub(crate) struct State {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) config: ResolvedConfig,
    pub(crate) vars: Map<String, Value>,
    pub(crate) data: Value,
    pub(crate) user: Option<Value>,
    pub(crate) labels: Labels,
    pub(crate) template_extensions: Vec<TemplateExtension>,
    pub(crate) renderer_chains: HashMap<String, RendererChain<RendererFn>>,
    pub(crate) plugins: HashMap<String, Rc<dyn Plugin>>,
    pub(crate) subscription_ids: HashSet<HandlerId>,
    pub(crate) request: Option<Rc<dyn DataRequest>>,
    pub(crate) rendered: bool,
    pub(crate) root: Option<Element>,
    pub(crate) elements: HashMap<String, Element>,
    pub(crate) retry_timer: Option<Box<dyn TimerHandle>>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            lifecycle: Lifecycle::Created,
            config: ResolvedConfig::default(),
            vars: Map::new(),
            data: Value::Null,
            user: None,
            labels: Labels::default(),
            template_extensions: Vec::new(),
            renderer_chains: HashMap::new(),
            plugins: HashMap::new(),
            subscription_ids: HashSet::new(),
            request: None,
            rendered: false,
            root: None,
            elements: HashMap::new(),
            retry_timer: None,
        }
    }
}

struct ComponentInner {
    manifest: Rc<Manifest>,
    bus: Rc<EventBus>,
    services: Services,
    /// Caller config, consumed by the config phase.
    pending_config: RefCell<Option<ComponentConfig>>,
    state: RefCell<State>,
}

/// Handle onto one live widget instance.
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

impl Component {
    /// Builds and initializes a component.
    ///
    /// Construction is fail-soft: a missing target or empty appkey
    /// yields an inert instance whose operations are all no-ops,
    /// instead of an error.
    #[must_use]
    pub fn create(
        manifest: Manifest,
        config: ComponentConfig,
        bus: Rc<EventBus>,
        services: Services,
    ) -> Component {
        let component = Component {
            inner: Rc::new(ComponentInner {
                manifest: Rc::new(manifest),
                bus,
                services,
                pending_config: RefCell::new(None),
                state: RefCell::new(State::default()),
            }),
        };
        if config.target.is_none() || config.appkey.is_empty() {
            warn!(
                name = %component.name(),
                "missing target or appkey, instance is inert"
            );
            component.state_mut().lifecycle = Lifecycle::Inert;
            return component;
        }
        {
            let mut state = component.state_mut();
            state.lifecycle = Lifecycle::Initializing;
            state.data = match &config.data {
                Value::Null => json!({}),
                data => data.clone(),
            };
        }
        *component.inner.pending_config.borrow_mut() = Some(config);
        component.run_phases(Phase::FIRST_RUN);
        component
    }

    // === accessors ===

    #[must_use]
    pub fn name(&self) -> String {
        self.inner.manifest.name.clone()
    }

    #[must_use]
    pub fn context(&self) -> Context {
        self.state().config.context.clone()
    }

    #[must_use]
    pub fn appkey(&self) -> String {
        self.state().config.appkey.clone()
    }

    /// Whether this instance was constructed by another component.
    #[must_use]
    pub fn dependent(&self) -> bool {
        self.state().config.parent.is_some()
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.state().lifecycle
    }

    #[must_use]
    pub fn user(&self) -> Option<Value> {
        self.state().user.clone()
    }

    #[must_use]
    pub fn data(&self) -> Value {
        self.state().data.clone()
    }

    pub fn set_data(&self, data: Value) {
        self.state_mut().data = data;
    }

    #[must_use]
    pub fn var(&self, key: &str) -> Option<Value> {
        self.state().vars.get(key).cloned()
    }

    pub fn set_var(&self, key: impl Into<String>, value: Value) {
        self.state_mut().vars.insert(key.into(), value);
    }

    #[must_use]
    pub fn label(&self, key: &str) -> Option<String> {
        self.state().labels.get(key).map(str::to_string)
    }

    /// Dot-path lookup in the merged widget-specific config values.
    #[must_use]
    pub fn config_value(&self, path: &str) -> Option<Value> {
        self.state().config.value(path).cloned()
    }

    #[must_use]
    pub fn target(&self) -> Option<Rc<dyn Target>> {
        self.state().config.target.clone()
    }

    #[must_use]
    pub fn css_prefix(&self) -> String {
        self.inner.manifest.css_prefix()
    }

    #[must_use]
    pub fn bus(&self) -> Rc<EventBus> {
        Rc::clone(&self.inner.bus)
    }

    /// The in-flight data request, if the widget registered one.
    #[must_use]
    pub fn request(&self) -> Option<Rc<dyn DataRequest>> {
        self.state().request.clone()
    }

    pub fn set_request(&self, request: Rc<dyn DataRequest>) {
        self.state_mut().request = Some(request);
    }

    /// Invokes a manifest-declared method.
    pub fn invoke(&self, method: &str, args: &Value) -> Result<Value, ComponentError> {
        match self.lifecycle() {
            Lifecycle::Destroyed => return Err(ComponentError::Destroyed(self.name())),
            Lifecycle::Inert => return Err(ComponentError::Inert(self.name())),
            _ => {}
        }
        let Some(method_fn) = self.inner.manifest.methods.get(method).cloned() else {
            return Err(ComponentError::UnknownMethod(method.to_string()));
        };
        Ok(method_fn(self, args))
    }

    // === events interface ===

    /// Publishes a component event.
    ///
    /// The topic is auto-prefixed with the component name, the data
    /// passes through the manifest's `prepare_event` hook, and the
    /// envelope is stamped with the instance's context.
    pub fn publish(&self, topic: &str, data: Value) {
        if !self.lifecycle().is_active() {
            return;
        }
        let full_topic = format!("{}.{}", self.inner.manifest.name, topic);
        let data = match self.inner.manifest.prepare_event.clone() {
            Some(hook) => hook(self, data),
            None => data,
        };
        let envelope = Envelope::new(full_topic, self.context(), data);
        self.inner.bus.publish(&envelope);
    }

    /// Subscribes a handler bound to this instance.
    ///
    /// The context defaults to the instance's own; the returned id is
    /// recorded so the destroy handler can unsubscribe it. Topics are
    /// taken verbatim, without name prefixing.
    pub fn subscribe(
        &self,
        topic: &str,
        context: Option<Context>,
        once: bool,
        handler: EventHandler,
    ) -> HandlerId {
        let context = context.unwrap_or_else(|| self.context());
        let component = self.clone();
        let wrapped = move |topic: &str, data: &Value| handler(&component, topic, data);
        let id = if once {
            self.inner.bus.subscribe_once(topic, context, wrapped)
        } else {
            self.inner.bus.subscribe(topic, context, wrapped)
        };
        self.state_mut().subscription_ids.insert(id);
        id
    }

    /// Drops one of this instance's subscriptions. The id leaves the
    /// recorded set first.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        self.state_mut().subscription_ids.remove(&id);
        self.inner.bus.unsubscribe(id)
    }

    // === extension interface (for plugins) ===

    /// Queues a structural template extension.
    pub fn extend_template(&self, extension: TemplateExtension) {
        self.state_mut().template_extensions.push(extension);
    }

    /// Prepends a renderer to the named element's chain. The newest
    /// registration executes first.
    pub fn extend_renderer(&self, name: impl Into<String>, renderer: RendererFn) {
        self.state_mut()
            .renderer_chains
            .entry(name.into())
            .or_default()
            .prepend(renderer);
    }

    // === plugins ===

    #[must_use]
    pub fn plugin(&self, name: &str) -> Option<Rc<dyn Plugin>> {
        self.state().plugins.get(name).cloned()
    }

    /// Evaluates the plugin's enabled switch, defaulting to `true`.
    #[must_use]
    pub fn plugin_enabled(&self, name: &str) -> bool {
        let enabled = self
            .state()
            .config
            .plugins
            .get(name)
            .map(|entry| entry.enabled.clone())
            .unwrap_or_default();
        enabled.evaluate(self)
    }

    /// Overrides a plugin's enabled switch. Plugin constructors use
    /// this to disable themselves.
    pub fn set_plugin_enabled(&self, name: &str, enabled: impl Into<Enabled>) {
        let mut state = self.state_mut();
        let entry = state
            .config
            .plugins
            .entry(name.to_string())
            .or_insert_with(|| PluginEntry::new(name));
        entry.enabled = enabled.into();
    }

    // === lifecycle ===

    /// Full teardown. Equivalent to `destroy_with(json!({}))` plus the
    /// transition into the terminal state.
    pub fn destroy(&self) {
        if !self.lifecycle().is_active() {
            return;
        }
        self.destroy_with(json!({}));
        self.state_mut().lifecycle = Lifecycle::Destroyed;
    }

    /// Publishes the destroy topic at this instance's context with
    /// `{"self": true, "producer_context": <own>}` merged with the
    /// caller's overrides. The destroy handler (and, through
    /// propagation, every dependent child's) runs synchronously within
    /// this call. The publish does not bubble, so destroying a child
    /// never tears its parent down.
    pub fn destroy_with(&self, overrides: Value) {
        if !self.lifecycle().is_active() {
            return;
        }
        let mut data = json!({
            "self": true,
            "producer_context": self.context().as_str(),
        });
        crate::config::deep_merge(&mut data, overrides);
        let envelope = Envelope::new(DESTROY_TOPIC, self.context(), data)
            .with_bubble(false)
            .with_global(false);
        self.inner.bus.publish(&envelope);
    }

    /// Tears the instance down in place and re-runs the refresh phase
    /// subset with the originally configured data restored.
    pub fn refresh(&self) {
        if !self.lifecycle().is_active() {
            return;
        }
        self.state_mut().lifecycle = Lifecycle::Refreshing;
        self.destroy_with(json!({"self": false}));
        let restored = self.state().config.data.clone();
        self.state_mut().data = match restored {
            Value::Null => json!({}),
            data => data,
        };
        self.run_phases(Phase::REFRESH);
    }

    // === crate-internal plumbing ===

    pub(crate) fn state(&self) -> Ref<'_, State> {
        self.inner.state.borrow()
    }

    pub(crate) fn state_mut(&self) -> RefMut<'_, State> {
        self.inner.state.borrow_mut()
    }

    pub(crate) fn manifest(&self) -> &Rc<Manifest> {
        &self.inner.manifest
    }

    pub(crate) fn services(&self) -> &Services {
        &self.inner.services
    }

    /// The named element registered by the last discovery pass.
    #[must_use]
    pub fn element(&self, name: &str) -> Option<Element> {
        self.state().elements.get(name).cloned()
    }

    /// Root of the last non-stealth render.
    #[must_use]
    pub fn root(&self) -> Option<Element> {
        self.state().root.clone()
    }

    #[must_use]
    pub fn rendered(&self) -> bool {
        self.state().rendered
    }

    // === phase executor ===

    fn run_phases(&self, phases: &[Phase]) {
        for (index, phase) in phases.iter().enumerate() {
            if !self.lifecycle().is_active() {
                return;
            }
            debug!(name = %self.inner.manifest.name, %phase, "phase");
            match phase {
                Phase::Vars => self.phase_vars(),
                Phase::Extension => self.phase_extension(),
                Phase::Config => self.phase_config(),
                // publish/subscribe/unsubscribe are inherent operations
                // already bound to the instance; nothing to build here.
                Phase::Events => {}
                Phase::Subscriptions => self.phase_subscriptions(),
                Phase::Labels => self.phase_labels(),
                Phase::Css => self.phase_css(),
                Phase::Renderers => self.phase_renderers(),
                Phase::Dom => self.phase_dom(),
                Phase::Loading => self.phase_loading(),
                Phase::User => {
                    // suspension point: the rest of the sequence runs
                    // inside the session-resolution callback
                    self.phase_user(phases[index + 1..].to_vec());
                    return;
                }
                Phase::Plugins => self.phase_plugins(),
            }
        }
    }

    /// Resets instance vars to the manifest defaults. The plugin map
    /// and subscription-id set are vars-phase defaults too, so a
    /// refresh starts them over.
    fn phase_vars(&self) {
        let defaults = self.inner.manifest.vars.clone();
        let mut state = self.state_mut();
        state.vars = defaults;
        state.plugins.clear();
        state.subscription_ids.clear();
    }

    fn phase_extension(&self) {
        let mut state = self.state_mut();
        state.template_extensions.clear();
        state.renderer_chains.clear();
    }

    fn phase_config(&self) {
        let Some(config) = self.inner.pending_config.borrow_mut().take() else {
            return;
        };
        let mut resolved = ResolvedConfig::resolve(&self.inner.manifest, config);
        let normalizers = self.inner.manifest.normalizers.clone();
        if !normalizers.is_empty() {
            // resolved is not installed yet, so normalizers reading the
            // component see the previous (default) config
            resolved.normalize(&normalizers, self);
        }
        self.state_mut().config = resolved;
    }

    fn phase_subscriptions(&self) {
        for binding in self.inner.manifest.events.clone() {
            self.subscribe_binding(binding);
        }

        // stale-data notification re-sends the active request
        self.subscribe(
            DATA_INVALIDATE_TOPIC,
            None,
            false,
            Rc::new(|component, _topic, _data| {
                if let Some(request) = component.request() {
                    request.send(true);
                }
                HandlerOutcome::default()
            }),
        );

        // one-shot ready callback after the first render
        let ready = self.state().config.ready.clone();
        if let Some(ready) = ready {
            let topic = format!("{}.onReady", self.inner.manifest.name);
            self.subscribe(
                &topic,
                None,
                true,
                Rc::new(move |component, _topic, _data| {
                    ready(component);
                    HandlerOutcome::default()
                }),
            );
        }

        self.subscribe(
            DESTROY_TOPIC,
            None,
            true,
            Rc::new(|component, _topic, data| {
                component.on_destroy(data);
                HandlerOutcome::default()
            }),
        );

        if self.dependent() {
            return;
        }

        // top-level instances refresh when the user session changes
        self.subscribe(
            SESSION_INVALIDATE_TOPIC,
            Some(Context::global()),
            false,
            Rc::new(|component, _topic, _data| {
                component.refresh();
                HandlerOutcome::default()
            }),
        );
    }

    fn phase_labels(&self) {
        let labels = Labels::resolve(&self.inner.manifest.labels, &self.state().config.labels);
        self.state_mut().labels = labels;
    }

    fn phase_css(&self) {
        self.inner
            .services
            .styles
            .install("canopy", crate::messages::BASE_CSS);
        let prefix = self.css_prefix();
        if let Some(target) = self.target() {
            target.add_class(prefix.trim_end_matches('-'));
        }
        if let Some(css) = self.inner.manifest.css.clone() {
            let css = self.substitute(&css, None);
            self.inner
                .services
                .styles
                .install(&self.inner.manifest.name, &css);
        }
    }

    fn phase_renderers(&self) {
        for (name, renderer) in self.inner.manifest.renderers.clone() {
            self.extend_renderer(name, renderer);
        }
    }

    fn phase_dom(&self) {
        let mut state = self.state_mut();
        state.rendered = false;
        state.root = None;
        state.elements.clear();
    }

    fn phase_loading(&self) {
        let message = self.state().labels.get_or_key("loading");
        self.show_message(crate::messages::MessageData::loading(message));
    }

    fn phase_user(&self, rest: Vec<Phase>) {
        let preset = self.state().config.user.clone();
        if let Some(user) = preset {
            self.state_mut().user = Some(user);
            self.run_phases(&rest);
            return;
        }
        let appkey = self.appkey();
        let component = self.clone();
        self.inner.services.session.resolve(
            &appkey,
            Box::new(move |user| {
                component.state_mut().user = Some(user);
                component.run_phases(&rest);
            }),
        );
    }

    fn phase_plugins(&self) {
        let scripts = self.plugin_scripts();
        let component = self.clone();
        self.inner.services.loader.load(
            &scripts,
            Box::new(move || {
                component.construct_plugins();
                component.state_mut().lifecycle = Lifecycle::Ready;
                let init = Rc::clone(&component.inner.manifest.init);
                init(&component);
            }),
        );
    }

    fn subscribe_binding(&self, binding: EventBinding) {
        self.subscribe(&binding.topic, binding.context, binding.once, binding.handler);
    }

    fn plugin_scripts(&self) -> Vec<String> {
        let order = self.state().config.plugin_order.clone();
        let mut scripts = Vec::new();
        for name in &order {
            if let Some(class) = self
                .inner
                .services
                .registry
                .get_class(name, &self.inner.manifest.name)
            {
                scripts.extend(class.dependencies());
            }
        }
        scripts
    }

    fn construct_plugins(&self) {
        let order = self.state().config.plugin_order.clone();
        for name in &order {
            let Some(class) = self
                .inner
                .services
                .registry
                .get_class(name, &self.inner.manifest.name)
            else {
                debug!(plugin = %name, "no class registered, skipped");
                continue;
            };
            if !self.plugin_enabled(name) {
                continue;
            }
            let instance: Rc<dyn Plugin> = Rc::from(class.construct(self));
            // the constructor may have disabled the plugin, re-check
            // before committing it
            if self.plugin_enabled(name) {
                self.state_mut().plugins.insert(name.clone(), instance);
            }
        }
    }

    /// The destroy handler. Runs once per registration, triggered by
    /// [`DESTROY_TOPIC`] at this instance's context.
    fn on_destroy(&self, data: &Value) {
        // plugins first, in registration order
        let order = self.state().config.plugin_order.clone();
        for name in order {
            let plugin = self.state().plugins.get(&name).cloned();
            if let Some(plugin) = plugin {
                plugin.destroy();
            }
        }

        if let Some(hook) = self.inner.manifest.destroy.clone() {
            hook(self, data);
        }

        if let Some(timer) = self.state_mut().retry_timer.take() {
            timer.cancel();
        }
        if let Some(request) = self.state_mut().request.take() {
            request.abort();
        }

        // unsubscribe everything when destroying the whole instance, or
        // when an ancestor with a different context triggered this
        let self_destroy = data.get("self").and_then(Value::as_bool).unwrap_or(false);
        let producer = data.get("producer_context").and_then(Value::as_str);
        let own = self.context();
        if self_destroy || producer != Some(own.as_str()) {
            let ids: Vec<HandlerId> = self.state_mut().subscription_ids.drain().collect();
            for id in ids {
                self.inner.bus.unsubscribe(id);
            }
        }

        if !self.dependent() {
            if let Some(target) = self.target() {
                target.empty();
            }
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.inner.manifest.name)
            .field("lifecycle", &self.state().lifecycle)
            .field("context", &self.state().config.context)
            .finish()
    }
}
