//! Component runtime for Canopy.
//!
//! This crate ties the event and template layers together into a full
//! component lifecycle: a manifest describes a component class, a
//! config instantiates it, and the runtime drives it through its
//! phases, keeps its rendered tree current, and tears it down on
//! request.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       canopy-component                       │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────────────────┐  │
//! │  │  Manifest  │  │   Config   │  │       Component        │  │
//! │  │ (class     │  │ (instance  │─▶│  lifecycle phases      │  │
//! │  │  recipe)   │─▶│  settings) │  │  render pipeline       │  │
//! │  └────────────┘  └────────────┘  │  messages / plugins    │  │
//! │                                  └───────────┬────────────┘  │
//! └──────────────────────────────────────────────┼───────────────┘
//!                  ┌────────────────┬────────────┴───┐
//!                  ▼                ▼                ▼
//!          ┌──────────────┐ ┌───────────────┐ ┌────────────┐
//!          │ canopy-event │ │canopy-template│ │  Services  │
//!          │  (EventBus)  │ │  (Element,    │ │ (host      │
//!          │              │ │   renderers)  │ │  traits)   │
//!          └──────────────┘ └───────────────┘ └────────────┘
//! ```
//!
//! # Lifecycle
//!
//! [`Component::create`] runs the first-run phase sequence; the user
//! phase may suspend it until the session resolves. [`Component::refresh`]
//! re-runs the shorter refresh sequence after a soft teardown.
//!
//! | Surface | Entry points |
//! |---------|--------------|
//! | lifecycle | [`Component::create`], [`Component::refresh`], [`Component::destroy`] |
//! | messaging | [`Component::publish`], [`Component::subscribe`] |
//! | rendering | [`Component::render`], [`Component::render_with`], [`Component::parent_renderer`] |
//! | overlays | [`Component::show_message`], [`Component::show_error`] |
//! | methods | [`Component::invoke`] |
//!
//! Host integration comes in through the [`Services`] bundle; the
//! runtime never touches ambient globals.
//!
//! # Example
//!
//! ```
//! use canopy_component::testing::TestHost;
//! use canopy_component::{Component, ComponentConfig, Lifecycle, Manifest};
//! use canopy_template::MemoryTarget;
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let host = TestHost::new(json!({"name": "dev"}));
//! let target = Rc::new(MemoryTarget::new());
//! let manifest = Manifest::new("Status.Banner").main_template("<div>{label:loading}</div>");
//! let component = Component::create(
//!     manifest,
//!     ComponentConfig::new(target, "app-key"),
//!     Rc::clone(&host.bus),
//!     host.services(),
//! );
//! assert_eq!(component.lifecycle(), Lifecycle::Ready);
//! ```

mod collaborators;
mod component;
mod config;
mod error;
mod labels;
mod lifecycle;
mod manifest;
mod messages;
mod render;

pub mod testing;

pub use collaborators::{
    DataRequest, Plugin, PluginClass, PluginRegistry, ScriptLoader, Services, StyleSink, Timer,
    TimerHandle, UserSession,
};
pub use component::{
    Component, DATA_INVALIDATE_TOPIC, DESTROY_TOPIC, SESSION_INVALIDATE_TOPIC,
};
pub use config::{
    ComponentConfig, Enabled, InfoMessages, MessageLayout, Normalizer, PluginEntry, ResolvedConfig,
};
pub use error::ComponentError;
pub use labels::Labels;
pub use lifecycle::{Lifecycle, Phase};
pub use manifest::{EventBinding, EventHandler, Manifest, MethodFn, RendererFn};
pub use messages::{ErrorInfo, ErrorOptions, MessageData, MessageKind};
pub use render::RenderArgs;

// Re-exported so downstream crates rarely need direct dependencies on
// the lower layers.
pub use canopy_event::{Context, Envelope, EventBus, HandlerId, HandlerOutcome};
pub use canopy_template::{Element, Target, Template, TemplateExtension};
