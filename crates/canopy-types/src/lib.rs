//! Core types for the Canopy component runtime.
//!
//! This crate provides the identifier and addressing types shared by the
//! event bus, the template engine, and the component runtime:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  canopy-types   : Context, HandlerId, ErrorCode  ◄── HERE   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  canopy-event   : EventBus, Envelope, HandlerOutcome        │
//! │  canopy-template: Element, substitution, renderer chains    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  canopy-component: Manifest, Component, lifecycle phases    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Context`] | Hierarchical (`/`-delimited) component address |
//! | [`HandlerId`] | Unique identifier of a bus subscription |
//! | [`ErrorCode`] | Unified machine-readable error interface |
//!
//! # Contexts
//!
//! A context identifies which component subtree an event pertains to.
//! Contexts form a tree:
//!
//! ```text
//! <context> :: "<id>"  or  "<parentContext>/<id>"
//! ```
//!
//! The reserved context `"global"` is the bus root; every publish with the
//! global flag set fans out to it exactly once.

mod context;
mod error;
mod id;

pub use context::Context;
pub use error::{ErrorCode, assert_error_code, assert_error_codes};
pub use id::HandlerId;
