//! Template engine for the Canopy component runtime.
//!
//! Turns a component's template text into a live element tree and keeps
//! that tree extensible: placeholders are substituted, queued structural
//! extensions rewrite the compiled markup, and per-element renderer
//! chains let plugins override how a named element is produced.
//!
//! # Compile Pipeline
//!
//! ```text
//!  template text ──▶ substitute ──▶ parse ──▶ extensions ──▶ Element
//!  {instr:key}       (scope)        (lenient)  (in order)      tree
//!                                                               │
//!                                                               ▼
//!                                                      Target::append
//! ```
//!
//! The crate is runtime-agnostic: it knows nothing about components,
//! configuration, or the event bus. The component runtime supplies the
//! [`SubstitutionScope`] instructions and drives the renderer chains.
//!
//! # Example
//!
//! ```
//! use canopy_template::{parse, substitute, EmptyScope};
//!
//! let markup = substitute("<p>{data:missing}ok</p>", &EmptyScope);
//! let tree = parse(&markup);
//! assert_eq!(tree.to_markup(), "<p>ok</p>");
//! ```

mod element;
mod extension;
mod markup;
mod renderer;
mod substitute;
mod target;

pub use element::{Element, Node};
pub use extension::{ExtensionAction, TemplateExtension};
pub use markup::parse;
pub use renderer::RendererChain;
pub use substitute::{resolve_path, substitute, EmptyScope, SubstitutionScope, Template};
pub use target::{MemoryTarget, Target};
