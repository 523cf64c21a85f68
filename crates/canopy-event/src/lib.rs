//! Hierarchical event bus for the Canopy component runtime.
//!
//! This crate provides the context-tree-addressed publish/subscribe
//! primitive that all Canopy components communicate through.
//!
//! # Dispatch Model
//!
//! ```text
//!                    publish(topic, "a/b", data)
//!                               │
//!          ┌────────────────────┼─────────────────────┐
//!          │ handlers at "a/b"  │                     │
//!          ▼                    ▼                     ▼
//!     origin node          bubble: "a"        propagation: "a/b/*"
//!     (snapshot,           (one ancestor      (every descendant,
//!      in order)            per step)          full depth)
//!                               │
//!                               ▼
//!                    one extra dispatch at "global"
//! ```
//!
//! Dispatch is synchronous and single-threaded: handlers run in-line on
//! the caller's stack, and a handler that publishes re-enters the bus
//! before its own call returns. The bus never holds an internal borrow
//! across a handler invocation, so re-entrant subscribe/unsubscribe/
//! publish calls are safe.
//!
//! # Stop Signals
//!
//! A handler returns a [`HandlerOutcome`] carrying explicit stop flags:
//!
//! | Flag | Suppresses |
//! |------|-----------|
//! | `stop_bubble` | delivery to ancestor contexts |
//! | `stop_children` | delivery into descendant contexts |
//! | `stop_siblings` | remaining handlers at the current node |
//!
//! A sibling-stop raised inside a descendant subtree halts only that
//! level's iteration, never ancestor levels.
//!
//! # Example
//!
//! ```
//! use canopy_event::{Envelope, EventBus, HandlerOutcome};
//! use canopy_types::Context;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let bus = EventBus::new();
//! let hits = Rc::new(Cell::new(0));
//!
//! let seen = Rc::clone(&hits);
//! bus.subscribe("App.onReady", Context::new("page/widget"), move |_topic, _data| {
//!     seen.set(seen.get() + 1);
//!     HandlerOutcome::default()
//! });
//!
//! bus.publish(&Envelope::new(
//!     "App.onReady",
//!     Context::new("page/widget"),
//!     serde_json::json!({"ok": true}),
//! ));
//! assert_eq!(hits.get(), 1);
//! ```

mod bus;
mod envelope;
mod outcome;

pub use bus::{EventBus, Handler};
pub use envelope::Envelope;
pub use outcome::HandlerOutcome;

// Re-export the addressing types for convenience.
pub use canopy_types::{Context, HandlerId};
