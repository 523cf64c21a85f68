//! External collaborator contracts.
//!
//! Everything the runtime needs from its host environment comes in
//! through these traits: plugin discovery, user-session resolution,
//! data requests, script loading, timers, and stylesheet installation.
//! The runtime never reaches for ambient globals; a [`Services`] bundle
//! is injected at construction.
//!
//! Recording mock implementations for every trait live in
//! [`crate::testing`].

use crate::Component;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// Resolves plugin names to constructible classes.
pub trait PluginRegistry {
    /// Looks up the class registered for `plugin` on the given host
    /// component name. `None` skips the plugin silently.
    fn get_class(&self, plugin: &str, component: &str) -> Option<Rc<dyn PluginClass>>;
}

/// A constructible plugin class from the registry.
pub trait PluginClass {
    /// Script resources that must be loaded before construction.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Builds a plugin instance bound to the host component.
    fn construct(&self, component: &Component) -> Box<dyn Plugin>;
}

/// A live plugin instance held in the component's plugin map.
pub trait Plugin {
    /// Teardown hook, called in registration order during destroy.
    fn destroy(&self) {}
}

/// Resolves the current user for an application key.
///
/// Resolution may complete inside the call (synchronously) or later;
/// the lifecycle suspends at the user gate until `ready` fires.
pub trait UserSession {
    fn resolve(&self, appkey: &str, ready: Box<dyn FnOnce(Value)>);
}

/// An in-flight data request owned by a component.
///
/// The runtime never inspects its internals beyond this contract.
pub trait DataRequest {
    fn send(&self, force: bool);
    fn abort(&self);
}

/// Loads script resources, then invokes `done`.
///
/// Core embeddings load nothing and call `done` in-line.
pub trait ScriptLoader {
    fn load(&self, resources: &[String], done: Box<dyn FnOnce()>);
}

/// Cancelable handle for a scheduled recurring timer.
pub trait TimerHandle {
    fn cancel(&self);
}

/// Schedules recurring ticks, used by the retry countdown.
pub trait Timer {
    fn schedule(&self, interval_ms: u64, tick: Box<dyn FnMut()>) -> Box<dyn TimerHandle>;
}

/// Installs component stylesheets, de-duplicated by name.
pub trait StyleSink {
    fn install(&self, name: &str, css: &str);
}

/// The collaborator bundle injected into every component.
#[derive(Clone)]
pub struct Services {
    pub registry: Rc<dyn PluginRegistry>,
    pub session: Rc<dyn UserSession>,
    pub loader: Rc<dyn ScriptLoader>,
    pub styles: Rc<dyn StyleSink>,
    pub timer: Rc<dyn Timer>,
}

impl Services {
    #[must_use]
    pub fn new(
        registry: Rc<dyn PluginRegistry>,
        session: Rc<dyn UserSession>,
        loader: Rc<dyn ScriptLoader>,
        styles: Rc<dyn StyleSink>,
        timer: Rc<dyn Timer>,
    ) -> Self {
        Self {
            registry,
            session,
            loader,
            styles,
            timer,
        }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Services { .. }")
    }
}
