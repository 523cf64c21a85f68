//! Recording mock collaborators for tests.
//!
//! Every [`crate::collaborators`] trait has an in-memory implementation
//! here, plus a [`TestHost`] bundle that wires them into a [`Services`]
//! with a fresh event bus. Tests drive asynchrony explicitly: a
//! deferred [`MockSession`] holds the user gate open until
//! `resolve_pending` is called, and [`ManualTimer`] only ticks when the
//! test says so.

use crate::collaborators::{
    DataRequest, Plugin, PluginClass, PluginRegistry, ScriptLoader, Services, StyleSink, Timer,
    TimerHandle, UserSession,
};
use crate::Component;
use canopy_event::EventBus;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Plugin registry backed by a hash map.
#[derive(Default)]
pub struct StaticRegistry {
    classes: RefCell<HashMap<String, Rc<dyn PluginClass>>>,
}

impl StaticRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, plugin: impl Into<String>, class: Rc<dyn PluginClass>) {
        self.classes.borrow_mut().insert(plugin.into(), class);
    }
}

impl PluginRegistry for StaticRegistry {
    fn get_class(&self, plugin: &str, _component: &str) -> Option<Rc<dyn PluginClass>> {
        self.classes.borrow().get(plugin).cloned()
    }
}

/// Plugin class built from a constructor closure.
pub struct FnPluginClass {
    dependencies: Vec<String>,
    construct: Box<dyn Fn(&Component) -> Box<dyn Plugin>>,
}

impl FnPluginClass {
    #[must_use]
    pub fn new(construct: impl Fn(&Component) -> Box<dyn Plugin> + 'static) -> Self {
        Self {
            dependencies: Vec::new(),
            construct: Box::new(construct),
        }
    }

    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

impl PluginClass for FnPluginClass {
    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    fn construct(&self, component: &Component) -> Box<dyn Plugin> {
        (self.construct)(component)
    }
}

/// Plugin that records its teardown.
pub struct RecordingPlugin {
    destroyed: Rc<Cell<bool>>,
}

impl RecordingPlugin {
    #[must_use]
    pub fn new(destroyed: Rc<Cell<bool>>) -> Self {
        Self { destroyed }
    }
}

impl Plugin for RecordingPlugin {
    fn destroy(&self) {
        self.destroyed.set(true);
    }
}

/// User session that resolves immediately or holds callbacks until the
/// test releases them.
#[derive(Default)]
pub struct MockSession {
    user: RefCell<Option<Value>>,
    pending: RefCell<Vec<Box<dyn FnOnce(Value)>>>,
}

impl MockSession {
    /// Session that resolves inside the `resolve` call.
    #[must_use]
    pub fn immediate(user: Value) -> Self {
        Self {
            user: RefCell::new(Some(user)),
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Session that parks callbacks until [`Self::resolve_pending`].
    #[must_use]
    pub fn deferred() -> Self {
        Self::default()
    }

    /// Releases every parked callback with the given user.
    pub fn resolve_pending(&self, user: Value) {
        let parked = self.pending.borrow_mut().split_off(0);
        for ready in parked {
            ready(user.clone());
        }
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl UserSession for MockSession {
    fn resolve(&self, _appkey: &str, ready: Box<dyn FnOnce(Value)>) {
        match self.user.borrow().clone() {
            Some(user) => ready(user),
            None => self.pending.borrow_mut().push(ready),
        }
    }
}

/// Data request that records sends and aborts.
#[derive(Default)]
pub struct MockRequest {
    sends: RefCell<Vec<bool>>,
    aborted: Cell<bool>,
}

impl MockRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sends(&self) -> Vec<bool> {
        self.sends.borrow().clone()
    }

    #[must_use]
    pub fn aborted(&self) -> bool {
        self.aborted.get()
    }
}

impl DataRequest for MockRequest {
    fn send(&self, force: bool) {
        self.sends.borrow_mut().push(force);
    }

    fn abort(&self) {
        self.aborted.set(true);
    }
}

/// Loader that records requested resources and completes in-line.
#[derive(Default)]
pub struct RecordingLoader {
    requests: RefCell<Vec<Vec<String>>>,
}

impl RecordingLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.borrow().clone()
    }
}

impl ScriptLoader for RecordingLoader {
    fn load(&self, resources: &[String], done: Box<dyn FnOnce()>) {
        self.requests.borrow_mut().push(resources.to_vec());
        done();
    }
}

/// Style sink that keeps installed sheets, de-duplicated by name.
#[derive(Default)]
pub struct RecordingStyleSink {
    sheets: RefCell<Vec<(String, String)>>,
}

impl RecordingStyleSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.sheets
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    #[must_use]
    pub fn css(&self, name: &str) -> Option<String> {
        self.sheets
            .borrow()
            .iter()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, css)| css.clone())
    }
}

impl StyleSink for RecordingStyleSink {
    fn install(&self, name: &str, css: &str) {
        let mut sheets = self.sheets.borrow_mut();
        if sheets.iter().any(|(sheet, _)| sheet == name) {
            return;
        }
        sheets.push((name.to_string(), css.to_string()));
    }
}

struct ManualHandle {
    canceled: Rc<Cell<bool>>,
}

impl TimerHandle for ManualHandle {
    fn cancel(&self) {
        self.canceled.set(true);
    }
}

type ScheduledTick = (Rc<Cell<bool>>, Box<dyn FnMut()>);

/// Timer that only advances when the test calls [`ManualTimer::tick`].
#[derive(Default)]
pub struct ManualTimer {
    scheduled: RefCell<Vec<ScheduledTick>>,
}

impl ManualTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires every live timer once. Timers scheduled or canceled during
    /// a tick are honored on the next one.
    pub fn tick(&self) {
        let mut ticks = self.scheduled.borrow_mut().split_off(0);
        for (canceled, tick) in &mut ticks {
            if !canceled.get() {
                tick();
            }
        }
        ticks.retain(|(canceled, _)| !canceled.get());
        let mut scheduled = self.scheduled.borrow_mut();
        ticks.append(&mut scheduled);
        *scheduled = ticks;
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.scheduled
            .borrow()
            .iter()
            .filter(|(canceled, _)| !canceled.get())
            .count()
    }
}

impl Timer for ManualTimer {
    fn schedule(&self, _interval_ms: u64, tick: Box<dyn FnMut()>) -> Box<dyn TimerHandle> {
        let canceled = Rc::new(Cell::new(false));
        self.scheduled
            .borrow_mut()
            .push((Rc::clone(&canceled), tick));
        Box::new(ManualHandle { canceled })
    }
}

/// Full mock environment for component tests.
pub struct TestHost {
    pub registry: Rc<StaticRegistry>,
    pub session: Rc<MockSession>,
    pub loader: Rc<RecordingLoader>,
    pub styles: Rc<RecordingStyleSink>,
    pub timer: Rc<ManualTimer>,
    pub bus: Rc<EventBus>,
}

impl TestHost {
    /// Host whose session resolves the given user synchronously.
    #[must_use]
    pub fn new(user: Value) -> Self {
        Self::with_session(MockSession::immediate(user))
    }

    /// Host whose session parks resolution until the test releases it.
    #[must_use]
    pub fn deferred() -> Self {
        Self::with_session(MockSession::deferred())
    }

    fn with_session(session: MockSession) -> Self {
        Self {
            registry: Rc::new(StaticRegistry::new()),
            session: Rc::new(session),
            loader: Rc::new(RecordingLoader::new()),
            styles: Rc::new(RecordingStyleSink::new()),
            timer: Rc::new(ManualTimer::new()),
            bus: Rc::new(EventBus::new()),
        }
    }

    #[must_use]
    pub fn services(&self) -> Services {
        Services::new(
            Rc::clone(&self.registry) as Rc<dyn PluginRegistry>,
            Rc::clone(&self.session) as Rc<dyn UserSession>,
            Rc::clone(&self.loader) as Rc<dyn ScriptLoader>,
            Rc::clone(&self.styles) as Rc<dyn StyleSink>,
            Rc::clone(&self.timer) as Rc<dyn Timer>,
        )
    }
}
