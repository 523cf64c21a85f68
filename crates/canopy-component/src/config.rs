//! Layered component configuration.
//!
//! The config phase merges three layers, highest priority last:
//! built-in defaults, manifest-declared defaults, caller-supplied
//! config. Keys the runtime consumes directly are typed fields;
//! widget-specific extras live in `values`, reachable through a
//! dot-path accessor restricted to that map.

use crate::{Component, Manifest};
use canopy_template::{resolve_path, Target};
use canopy_types::Context;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// A plugin's enabled switch: a literal or a predicate evaluated
/// against the host instance.
#[derive(Clone)]
pub enum Enabled {
    Literal(bool),
    Predicate(Rc<dyn Fn(&Component) -> bool>),
}

impl Enabled {
    #[must_use]
    pub fn evaluate(&self, component: &Component) -> bool {
        match self {
            Self::Literal(value) => *value,
            Self::Predicate(f) => f(component),
        }
    }
}

impl Default for Enabled {
    fn default() -> Self {
        Self::Literal(true)
    }
}

impl From<bool> for Enabled {
    fn from(value: bool) -> Self {
        Self::Literal(value)
    }
}

impl fmt::Debug for Enabled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// One declared plugin.
#[derive(Debug, Clone)]
pub struct PluginEntry {
    pub name: String,
    pub enabled: Enabled,
    /// Plugin-specific settings, opaque to the runtime.
    pub settings: Value,
}

impl PluginEntry {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: Enabled::default(),
            settings: Value::Null,
        }
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: impl Into<Enabled>) -> Self {
        self.enabled = enabled.into();
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = settings;
        self
    }
}

/// Info-message layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLayout {
    Compact,
    Full,
}

/// Info-message rendering switches.
#[derive(Debug, Clone, Copy)]
pub struct InfoMessages {
    pub enabled: bool,
    pub layout: MessageLayout,
}

impl Default for InfoMessages {
    fn default() -> Self {
        Self {
            enabled: true,
            layout: MessageLayout::Full,
        }
    }
}

/// Per-key normalizer hook the manifest may declare for `values` keys.
pub type Normalizer = Rc<dyn Fn(&Component, Value) -> Value>;

/// Caller-supplied configuration.
///
/// `target` and a non-empty `appkey` are required; an instance
/// constructed without them is inert.
#[derive(Clone, Default)]
pub struct ComponentConfig {
    pub target: Option<Rc<dyn Target>>,
    pub appkey: String,
    /// Explicit context override. Normally left `None` for a generated
    /// unique context.
    pub context: Option<Context>,
    /// Parent component's context; presence makes the instance
    /// dependent.
    pub parent: Option<Context>,
    /// Pre-resolved user. When set, the user gate completes
    /// synchronously.
    pub user: Option<Value>,
    pub data: Value,
    /// One-shot callback fired on the component's first `onReady`.
    pub ready: Option<Rc<dyn Fn(&Component)>>,
    pub labels: BTreeMap<String, String>,
    pub info_messages: Option<InfoMessages>,
    pub plugins: Vec<PluginEntry>,
    /// Widget-specific extras merged over the manifest's defaults.
    pub values: Map<String, Value>,
}

impl ComponentConfig {
    #[must_use]
    pub fn new(target: Rc<dyn Target>, appkey: impl Into<String>) -> Self {
        Self {
            target: Some(target),
            appkey: appkey.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for ComponentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentConfig")
            .field("appkey", &self.appkey)
            .field("context", &self.context)
            .field("parent", &self.parent)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

/// The merged configuration a live instance carries.
pub struct ResolvedConfig {
    pub target: Option<Rc<dyn Target>>,
    pub appkey: String,
    pub context: Context,
    pub parent: Option<Context>,
    pub user: Option<Value>,
    pub data: Value,
    pub ready: Option<Rc<dyn Fn(&Component)>>,
    pub labels: BTreeMap<String, String>,
    pub info_messages: InfoMessages,
    /// Plugin names in effective order.
    pub plugin_order: Vec<String>,
    pub plugins: HashMap<String, PluginEntry>,
    pub values: Map<String, Value>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            target: None,
            appkey: String::new(),
            context: Context::global(),
            parent: None,
            user: None,
            data: Value::Null,
            ready: None,
            labels: BTreeMap::new(),
            info_messages: InfoMessages::default(),
            plugin_order: Vec::new(),
            plugins: HashMap::new(),
            values: Map::new(),
        }
    }
}

impl ResolvedConfig {
    /// Merges the manifest's defaults with the caller's config.
    ///
    /// The context is a fresh unique id, nested under the parent's
    /// context when one is declared, unless the caller overrides it.
    /// The plugin list is normalized into an ordered map; a later
    /// duplicate moves to the end of the order.
    #[must_use]
    pub fn resolve(manifest: &Manifest, config: ComponentConfig) -> Self {
        let context = config.context.unwrap_or_else(|| match &config.parent {
            Some(parent) => parent.unique_child(),
            None => Context::unique(),
        });

        let mut values = manifest.config.clone();
        for (key, value) in config.values {
            match values.get_mut(&key) {
                Some(existing) => deep_merge(existing, value),
                None => {
                    values.insert(key, value);
                }
            }
        }

        let (plugin_order, plugins) = normalize_plugins(config.plugins);

        Self {
            target: config.target,
            appkey: config.appkey,
            context,
            parent: config.parent,
            user: config.user,
            data: config.data,
            ready: config.ready,
            labels: config.labels,
            info_messages: config.info_messages.unwrap_or_default(),
            plugin_order,
            plugins,
            values,
        }
    }

    /// Runs the manifest's per-key normalizers over the merged values.
    /// Split from `resolve` because normalizers see the component.
    pub fn normalize(&mut self, normalizers: &HashMap<String, Normalizer>, component: &Component) {
        for (key, normalizer) in normalizers {
            if let Some(value) = self.values.remove(key) {
                self.values.insert(key.clone(), normalizer(component, value));
            }
        }
    }

    /// Dot-path lookup inside the widget-specific values.
    #[must_use]
    pub fn value(&self, path: &str) -> Option<&Value> {
        match path.split_once('.') {
            Some((first, rest)) => resolve_path(self.values.get(first)?, rest),
            None => self.values.get(path),
        }
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("appkey", &self.appkey)
            .field("context", &self.context)
            .field("plugin_order", &self.plugin_order)
            .finish()
    }
}

fn normalize_plugins(list: Vec<PluginEntry>) -> (Vec<String>, HashMap<String, PluginEntry>) {
    let mut order: Vec<String> = Vec::new();
    let mut map = HashMap::new();
    for entry in list {
        order.retain(|name| *name != entry.name);
        order.push(entry.name.clone());
        map.insert(entry.name.clone(), entry);
    }
    (order, map)
}

/// Recursively merges `overlay` onto `base`; non-object overlay values
/// replace wholesale.
pub(crate) fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_plugin_moves_to_end_of_order() {
        let (order, map) = normalize_plugins(vec![
            PluginEntry::new("a"),
            PluginEntry::new("b"),
            PluginEntry::new("a").with_settings(json!({"v": 2})),
        ]);
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(map["a"].settings, json!({"v": 2}));
    }

    #[test]
    fn deep_merge_overlays_nested_objects() {
        let mut base = json!({"a": {"x": 1, "y": 2}, "b": 3});
        deep_merge(&mut base, json!({"a": {"y": 20, "z": 30}, "c": 4}));
        assert_eq!(base, json!({"a": {"x": 1, "y": 20, "z": 30}, "b": 3, "c": 4}));
    }

    #[test]
    fn deep_merge_replaces_non_objects() {
        let mut base = json!({"a": {"x": 1}});
        deep_merge(&mut base, json!({"a": [1, 2]}));
        assert_eq!(base, json!({"a": [1, 2]}));
    }

    #[test]
    fn resolved_context_nests_under_parent() {
        let manifest = Manifest::new("Widget");
        let parent = Context::new("p");
        let config = ComponentConfig {
            parent: Some(parent.clone()),
            ..ComponentConfig::default()
        };
        let resolved = ResolvedConfig::resolve(&manifest, config);
        assert_eq!(resolved.context.parent(), Some(parent));
    }

    #[test]
    fn caller_context_override_wins() {
        let manifest = Manifest::new("Widget");
        let config = ComponentConfig {
            context: Some(Context::new("fixed")),
            parent: Some(Context::new("p")),
            ..ComponentConfig::default()
        };
        let resolved = ResolvedConfig::resolve(&manifest, config);
        assert_eq!(resolved.context.as_str(), "fixed");
    }

    #[test]
    fn caller_values_override_manifest_defaults() {
        let manifest = Manifest::new("Widget")
            .with_config_default("limit", json!(10))
            .with_config_default("view", json!({"mode": "list", "rows": 5}));
        let mut values = Map::new();
        values.insert("view".into(), json!({"rows": 8}));
        let config = ComponentConfig {
            values,
            ..ComponentConfig::default()
        };
        let resolved = ResolvedConfig::resolve(&manifest, config);
        assert_eq!(resolved.value("limit"), Some(&json!(10)));
        assert_eq!(resolved.value("view.mode"), Some(&json!("list")));
        assert_eq!(resolved.value("view.rows"), Some(&json!(8)));
    }
}
