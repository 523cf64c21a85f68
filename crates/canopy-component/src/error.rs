//! Component layer errors.
//!
//! The runtime is deliberately lenient: ordinary dynamic conditions
//! (missing labels, unknown topics, absent plugins) degrade silently.
//! The errors below mark programmer-error boundaries only.
//!
//! # Error Code Convention
//!
//! All component errors use the `COMPONENT_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`UnknownMethod`](ComponentError::UnknownMethod) | `COMPONENT_UNKNOWN_METHOD` | No |
//! | [`Destroyed`](ComponentError::Destroyed) | `COMPONENT_DESTROYED` | No |
//! | [`Inert`](ComponentError::Inert) | `COMPONENT_INERT` | Yes |
//!
//! # Example
//!
//! ```
//! use canopy_component::ComponentError;
//! use canopy_types::ErrorCode;
//!
//! let err = ComponentError::UnknownMethod("collapse".into());
//! assert_eq!(err.code(), "COMPONENT_UNKNOWN_METHOD");
//! assert!(!err.is_recoverable());
//! ```

use canopy_types::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Component layer error.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum ComponentError {
    /// The manifest declares no method with this name.
    ///
    /// **Not recoverable** - fix the call site or the manifest.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// The component has been destroyed and must not be reused.
    ///
    /// **Not recoverable** - construct a new instance.
    #[error("component destroyed: {0}")]
    Destroyed(String),

    /// The component failed construction validation (missing target or
    /// appkey) and exists only as an inert shell.
    ///
    /// **Recoverable** - reconstruct with a complete configuration.
    #[error("component is inert: {0}")]
    Inert(String),
}

impl ErrorCode for ComponentError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownMethod(_) => "COMPONENT_UNKNOWN_METHOD",
            Self::Destroyed(_) => "COMPONENT_DESTROYED",
            Self::Inert(_) => "COMPONENT_INERT",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Inert(_))
    }
}
