//! Informational overlays: loading, error and retry-countdown messages.
//!
//! Message rendering honors the `info_messages` config switches.
//! Loading messages render stealth so they never count as the
//! component's real render; error messages replace content through the
//! ordinary render path.

use crate::config::MessageLayout;
use crate::Component;
use canopy_template::{Target, Template};
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;

/// Compact single-icon message layout.
const COMPACT_TEMPLATE: &str = "<span class=\"canopy-message canopy-message-icon \
     canopy-message-{data:type} {class:messageIcon} {class:messageText}\" \
     title=\"{data:message}\"></span>";

/// Full message layout with visible text.
const FULL_TEMPLATE: &str = "<div class=\"canopy-message {class:messageText}\">\
     <span class=\"canopy-message-icon canopy-message-{data:type} {class:messageIcon}\">\
     {data:message}</span></div>";

/// Base stylesheet installed once per style sink.
pub(crate) const BASE_CSS: &str = "\
.canopy-message { padding: 15px 0px; text-align: center; }\
.canopy-message-icon { height: 16px; padding-left: 16px; background: no-repeat left center; }\
.canopy-message .canopy-message-icon { padding-left: 21px; height: auto; }\
.canopy-message-empty { background-image: url(images/information.png); }\
.canopy-message-loading { background-image: url(images/loading.gif); }\
.canopy-message-error { background-image: url(images/warning.gif); }";

/// Kind of informational message; selects the icon class and, for
/// loading, the stealth render path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Empty,
    Loading,
    Error,
}

impl MessageKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Error => "error",
        }
    }
}

/// One informational message.
#[derive(Clone)]
pub struct MessageData {
    pub kind: MessageKind,
    pub message: String,
    /// Layout override; defaults to the `info_messages` config.
    pub layout: Option<MessageLayout>,
    /// Destination override; defaults to the component's target.
    pub target: Option<Rc<dyn Target>>,
}

impl MessageData {
    #[must_use]
    pub fn new(kind: MessageKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            layout: None,
            target: None,
        }
    }

    #[must_use]
    pub fn loading(message: impl Into<String>) -> Self {
        Self::new(MessageKind::Loading, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, message)
    }

    #[must_use]
    pub fn with_layout(mut self, layout: MessageLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: Rc<dyn Target>) -> Self {
        self.target = Some(target);
        self
    }
}

/// A data-layer error to surface as an overlay.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Display options for [`Component::show_error`].
#[derive(Clone, Default)]
pub struct ErrorOptions {
    /// Critical errors render as error overlays; transient ones as
    /// loading overlays.
    pub critical: bool,
    /// Milliseconds until the request layer retries. `None` means no
    /// retry; `Some(0)` with an active countdown shows "retrying".
    pub retry_in: Option<u64>,
    pub target: Option<Rc<dyn Target>>,
}

impl Component {
    /// Renders an informational message, honoring the `info_messages`
    /// config. Loading messages render stealth.
    pub fn show_message(&self, data: MessageData) {
        let info = self.state().config.info_messages;
        if !info.enabled {
            return;
        }
        let layout = data.layout.unwrap_or(info.layout);
        let template = match layout {
            MessageLayout::Compact => COMPACT_TEMPLATE,
            MessageLayout::Full => FULL_TEMPLATE,
        };
        self.render_with(crate::RenderArgs {
            template: Some(Template::from(template)),
            data: Some(json!({
                "type": data.kind.as_str(),
                "message": data.message,
            })),
            stealth: data.kind == MessageKind::Loading,
            target: data.target,
            ..crate::RenderArgs::default()
        });
    }

    /// Surfaces a data-layer error as an overlay.
    ///
    /// Without a retry the error label catalog is consulted
    /// (`error_<code>`, falling back to `(<code>) <message>`). With one,
    /// a countdown ticks once per second through the timer collaborator,
    /// re-rendering the interpolated label each tick.
    pub fn show_error(&self, error: &ErrorInfo, options: ErrorOptions) {
        match options.retry_in {
            None => {
                let key = format!("error_{}", error.code);
                let message = match self.label(&key) {
                    Some(label) => label,
                    None => format!("({}) {}", error.code, error.message),
                };
                let kind = if options.critical {
                    MessageKind::Error
                } else {
                    MessageKind::Loading
                };
                let mut data = MessageData::new(kind, message);
                data.target = options.target;
                self.show_message(data);
            }
            Some(0) if self.state().retry_timer.is_some() => {
                let message = self.state().labels.get_or_key("retrying");
                let mut data = MessageData::loading(message);
                data.target = options.target;
                self.show_message(data);
            }
            Some(retry_in) => {
                self.start_retry_countdown(error, retry_in, options.target);
            }
        }
    }

    /// Cancels a running retry countdown, if any.
    pub fn clear_retry_timer(&self) {
        if let Some(timer) = self.state_mut().retry_timer.take() {
            timer.cancel();
        }
    }

    fn start_retry_countdown(
        &self,
        error: &ErrorInfo,
        retry_in: u64,
        target: Option<Rc<dyn Target>>,
    ) {
        let seconds = Rc::new(Cell::new(retry_in / 1000));
        let key = format!("error_{}", error.code);
        let component = self.clone();
        let mut ticker = Box::new(move || {
            let left = seconds.get();
            if left == 0 {
                return;
            }
            seconds.set(left - 1);
            let message = component
                .state()
                .labels
                .interpolate(&key, &[("seconds", left.to_string())]);
            let mut data = MessageData::loading(message);
            data.target = target.clone();
            component.show_message(data);
        }) as Box<dyn FnMut()>;
        ticker();
        let handle = self.services().timer.schedule(1000, ticker);
        if let Some(previous) = self.state_mut().retry_timer.replace(handle) {
            previous.cancel();
        }
    }
}
