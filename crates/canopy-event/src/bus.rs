//! The event bus: context tree, subscription bookkeeping, dispatch.

use crate::{Envelope, HandlerOutcome};
use canopy_types::{Context, HandlerId};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// A subscription callback. Receives the topic and the published data,
/// returns the stop flags for the in-progress dispatch.
pub type Handler = Rc<dyn Fn(&str, &Value) -> HandlerOutcome>;

#[derive(Clone)]
struct Entry {
    id: HandlerId,
    once: bool,
    handler: Handler,
}

/// One node of a topic's context tree. The per-topic root is a pseudo-node
/// with no handlers whose children are the first path segments.
#[derive(Default)]
struct ContextNode {
    handlers: Vec<Entry>,
    children: BTreeMap<String, ContextNode>,
}

impl ContextNode {
    fn collect_ids(&self, out: &mut Vec<HandlerId>) {
        for entry in &self.handlers {
            out.push(entry.id);
        }
        for child in self.children.values() {
            child.collect_ids(out);
        }
    }
}

/// Context-tree-addressed publish/subscribe bus.
///
/// The bus owns the global context tree shared by every component.
/// Construct one at process start and inject it everywhere; there is no
/// ambient global instance.
///
/// # Consistency
///
/// No locking is involved — the bus relies on call-order discipline:
/// every node's handler list is snapshotted before iteration, so an
/// unsubscription performed by a running handler affects future reads,
/// not the in-progress loop. Interior borrows are never held across a
/// handler invocation, which makes re-entrant publishes safe.
///
/// # Example
///
/// ```
/// use canopy_event::{EventBus, HandlerOutcome};
/// use canopy_types::Context;
///
/// let bus = EventBus::new();
/// let id = bus.subscribe("App.onRender", Context::new("page"), |_t, _d| {
///     HandlerOutcome::default()
/// });
///
/// assert!(bus.unsubscribe(id));
/// assert!(!bus.unsubscribe(id)); // already removed
/// ```
pub struct EventBus {
    /// topic -> context tree.
    topics: RefCell<HashMap<String, ContextNode>>,
    /// Reverse index: handler id -> (topic, context).
    index: RefCell<HashMap<HandlerId, (String, Context)>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            topics: RefCell::new(HashMap::new()),
            index: RefCell::new(HashMap::new()),
        }
    }

    /// Subscribes `handler` to `topic` at `context`.
    ///
    /// Context-tree nodes for every path segment are created lazily.
    /// Returns the unique id of the new subscription.
    pub fn subscribe<F>(&self, topic: impl Into<String>, context: Context, handler: F) -> HandlerId
    where
        F: Fn(&str, &Value) -> HandlerOutcome + 'static,
    {
        self.attach(topic.into(), context, false, Rc::new(handler))
    }

    /// Subscribes a handler that fires at most once.
    ///
    /// The subscription is removed immediately before the handler's own
    /// invocation, so the at-most-once guarantee holds even if the
    /// handler republishes the same topic recursively.
    pub fn subscribe_once<F>(
        &self,
        topic: impl Into<String>,
        context: Context,
        handler: F,
    ) -> HandlerId
    where
        F: Fn(&str, &Value) -> HandlerOutcome + 'static,
    {
        self.attach(topic.into(), context, true, Rc::new(handler))
    }

    fn attach(&self, topic: String, context: Context, once: bool, handler: Handler) -> HandlerId {
        let id = HandlerId::new();
        self.ensure_path(&topic, &context);
        self.with_node_mut(&topic, &context, |node| {
            node.handlers.push(Entry { id, once, handler });
        });
        self.index
            .borrow_mut()
            .insert(id, (topic.clone(), context.clone()));
        debug!(%topic, %context, %id, once, "subscribed");
        id
    }

    /// Removes the subscription identified by `id`.
    ///
    /// Returns `false` if the id was already removed.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        let Some((topic, context)) = self.index.borrow_mut().remove(&id) else {
            return false;
        };
        let removed = self
            .with_node_mut(&topic, &context, |node| {
                match node.handlers.iter().position(|e| e.id == id) {
                    Some(pos) => {
                        node.handlers.remove(pos);
                        true
                    }
                    None => false,
                }
            })
            .unwrap_or(false);
        if removed {
            debug!(%topic, %context, %id, "unsubscribed");
        }
        removed
    }

    /// Removes the entire context node (and all handlers beneath it)
    /// under `topic`.
    ///
    /// Returns whether anything was removed.
    pub fn unsubscribe_context(&self, topic: &str, context: &Context) -> bool {
        let removed_node = {
            let mut topics = self.topics.borrow_mut();
            let Some(root) = topics.get_mut(topic) else {
                return false;
            };
            let mut node = root;
            let segments: Vec<&str> = context.segments().collect();
            let (last, path) = match segments.split_last() {
                Some(split) => split,
                None => return false,
            };
            for seg in path {
                match node.children.get_mut(*seg) {
                    Some(child) => node = child,
                    None => return false,
                }
            }
            node.children.remove(*last)
        };
        let Some(removed) = removed_node else {
            return false;
        };
        let mut ids = Vec::new();
        removed.collect_ids(&mut ids);
        let mut index = self.index.borrow_mut();
        for id in &ids {
            index.remove(id);
        }
        debug!(%topic, %context, handlers = ids.len(), "context removed");
        true
    }

    /// Global teardown: clears every topic's subscription tree.
    ///
    /// Returns whether any live subscription was removed.
    pub fn clear(&self) -> bool {
        let had_handlers = !self.index.borrow().is_empty();
        self.topics.borrow_mut().clear();
        self.index.borrow_mut().clear();
        had_handlers
    }

    /// Publishes an envelope.
    ///
    /// Dispatch order: the origin node's handlers (subscription order),
    /// then ancestors while bubbling is allowed, then every descendant
    /// node full-depth while propagation is allowed, then exactly one
    /// extra dispatch at the `"global"` context.
    ///
    /// Publishing a topic nothing ever subscribed to is a no-op.
    pub fn publish(&self, envelope: &Envelope) {
        if envelope.topic.is_empty() {
            warn!("publish with empty topic ignored");
            return;
        }
        if !self.topics.borrow().contains_key(&envelope.topic) {
            trace!(topic = %envelope.topic, "publish: unknown topic");
            return;
        }
        // Lazily create the context path inside the known topic tree so
        // bubbling always reaches subscribed ancestors.
        self.ensure_path(&envelope.topic, &envelope.context);
        trace!(topic = %envelope.topic, context = %envelope.context, "publish");

        let mut last = HandlerOutcome::default();
        self.dispatch(envelope, &mut last);

        if envelope.global && !envelope.context.is_global() {
            let global_env = Envelope {
                context: Context::global(),
                ..envelope.clone()
            };
            let mut last = HandlerOutcome::default();
            self.dispatch(&global_env, &mut last);
        }
    }

    /// Returns the number of handlers directly attached at a node.
    #[must_use]
    pub fn handler_count(&self, topic: &str, context: &Context) -> usize {
        self.with_node(topic, context, |node| node.handlers.len())
            .unwrap_or(0)
    }

    /// Returns the number of live subscriptions across every topic.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.index.borrow().len()
    }

    // === dispatch internals ===

    fn dispatch(&self, env: &Envelope, last: &mut HandlerOutcome) {
        self.run_handlers_at(&env.topic, &env.context, &env.data, last);

        // Ascend exactly one level per recursive step; the last outcome
        // threads through so a bubble-stop anywhere halts the ascent.
        if env.bubble && !last.stop_bubble {
            if let Some(parent) = env.context.parent() {
                let derived = Envelope {
                    context: parent,
                    propagation: false,
                    global: false,
                    ..env.clone()
                };
                self.dispatch(&derived, last);
            }
        }

        if env.propagation && !last.stop_children {
            self.visit_descendants(&env.topic, &env.context, &env.data);
        }
    }

    fn run_handlers_at(
        &self,
        topic: &str,
        context: &Context,
        data: &Value,
        last: &mut HandlerOutcome,
    ) {
        // Defensive copy of the handler list so in-handler unsubscribe
        // actions affect future reads, not the in-progress loop.
        let snapshot: Vec<Entry> = self
            .with_node(topic, context, |node| node.handlers.clone())
            .unwrap_or_default();
        for entry in snapshot {
            if entry.once {
                // Removed before invocation: at-most-once even when the
                // handler republishes the same topic recursively.
                self.unsubscribe(entry.id);
            }
            *last = (entry.handler)(topic, data);
            if last.stop_siblings {
                break;
            }
        }
    }

    /// Visits every descendant of `context`, full depth. A sibling-stop
    /// raised at one level halts only that level's iteration.
    fn visit_descendants(&self, topic: &str, context: &Context, data: &Value) {
        let names: Vec<String> = self
            .with_node(topic, context, |node| {
                node.children.keys().cloned().collect()
            })
            .unwrap_or_default();
        for name in names {
            let child = context.child(&name);
            let mut outcome = HandlerOutcome::default();
            self.run_handlers_at(topic, &child, data, &mut outcome);
            if !outcome.stop_children {
                self.visit_descendants(topic, &child, data);
            }
            if outcome.stop_siblings {
                break;
            }
        }
    }

    // === tree navigation ===

    fn ensure_path(&self, topic: &str, context: &Context) {
        let mut topics = self.topics.borrow_mut();
        let mut node = topics.entry(topic.to_string()).or_default();
        for seg in context.segments() {
            node = node.children.entry(seg.to_string()).or_default();
        }
    }

    fn with_node<R>(
        &self,
        topic: &str,
        context: &Context,
        f: impl FnOnce(&ContextNode) -> R,
    ) -> Option<R> {
        let topics = self.topics.borrow();
        let mut node = topics.get(topic)?;
        for seg in context.segments() {
            node = node.children.get(seg)?;
        }
        Some(f(node))
    }

    fn with_node_mut<R>(
        &self,
        topic: &str,
        context: &Context,
        f: impl FnOnce(&mut ContextNode) -> R,
    ) -> Option<R> {
        let mut topics = self.topics.borrow_mut();
        let mut node = topics.get_mut(topic)?;
        for seg in context.segments() {
            node = node.children.get_mut(seg)?;
        }
        Some(f(node))
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.topics.borrow().len())
            .field("subscriptions", &self.index.borrow().len())
            .finish()
    }
}
