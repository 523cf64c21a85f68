//! Component lifecycle states and initialization phases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a component is in its life.
///
/// ```text
/// Created ──▶ Initializing ──▶ Ready ◀──▶ Refreshing
///    │                           │
///    ▼                           ▼
///  Inert                     Destroyed (terminal)
/// ```
///
/// `Inert` marks an instance that failed construction validation
/// (missing target or appkey); every operation on it is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Created,
    Initializing,
    Ready,
    Refreshing,
    Destroyed,
    Inert,
}

impl Lifecycle {
    /// Whether the instance still responds to operations.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Destroyed | Self::Inert)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Refreshing => "refreshing",
            Self::Destroyed => "destroyed",
            Self::Inert => "inert",
        };
        f.write_str(name)
    }
}

/// One initialization phase.
///
/// First construction runs the full sequence in [`Phase::FIRST_RUN`]
/// order; `refresh()` re-runs the subset in [`Phase::REFRESH`]. The
/// `User` phase is the only suspension point: phases after it run inside
/// the session-resolution callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Vars,
    Extension,
    Config,
    Events,
    Subscriptions,
    Labels,
    Css,
    Renderers,
    Dom,
    Loading,
    User,
    Plugins,
}

impl Phase {
    /// Full first-construction sequence.
    pub const FIRST_RUN: &'static [Phase] = &[
        Phase::Vars,
        Phase::Extension,
        Phase::Config,
        Phase::Events,
        Phase::Subscriptions,
        Phase::Labels,
        Phase::Css,
        Phase::Renderers,
        Phase::Dom,
        Phase::Loading,
        Phase::User,
        Phase::Plugins,
    ];

    /// Subset re-run by `refresh()`. Config, labels and css are not
    /// redone.
    pub const REFRESH: &'static [Phase] = &[
        Phase::Vars,
        Phase::Extension,
        Phase::Subscriptions,
        Phase::Renderers,
        Phase::Loading,
        Phase::User,
        Phase::Plugins,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vars => "vars",
            Self::Extension => "extension",
            Self::Config => "config",
            Self::Events => "events",
            Self::Subscriptions => "subscriptions",
            Self::Labels => "labels",
            Self::Css => "css",
            Self::Renderers => "renderers",
            Self::Dom => "dom",
            Self::Loading => "loading",
            Self::User => "user",
            Self::Plugins => "plugins",
        };
        f.write_str(name)
    }
}
