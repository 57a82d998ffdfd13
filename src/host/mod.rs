// Seam between the shell's coordination logic and the native window layer.
// The Tauri implementation lives in `native`; tests use `testing`.

pub mod native;
#[cfg(test)]
pub mod testing;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::HostError;
use crate::shell::bridge::BackendEvent;
use crate::shell::style::UiStyle;
use crate::state::tab::TabData;
use crate::state::window::{Bounds, Point, WindowId};

/// Everything needed to construct one native window.
#[derive(Debug, Clone)]
pub struct WindowSpec {
    pub id: WindowId,
    pub label: String,
    /// Place the window here instead of centering it
    pub origin: Option<Point>,
    /// Style the content should paint with before its first style-changed signal
    pub style: UiStyle,
}

/// Signals delivered to a single window's content layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentEvent {
    TabReceived(TabData),
    DropIndicator { visible: bool },
    StyleChanged(UiStyle),
    Backend(BackendEvent),
}

#[derive(Serialize)]
struct DropIndicatorPayload {
    visible: bool,
}

#[derive(Serialize)]
struct StyleChangedPayload {
    style: UiStyle,
}

impl ContentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ContentEvent::TabReceived(_) => "tab-received",
            ContentEvent::DropIndicator { .. } => "drop-indicator",
            ContentEvent::StyleChanged(_) => "style-changed",
            ContentEvent::Backend(_) => "backend-event",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            ContentEvent::TabReceived(tab) => json!(tab),
            ContentEvent::DropIndicator { visible } => {
                json!(DropIndicatorPayload { visible: *visible })
            }
            ContentEvent::StyleChanged(style) => json!(StyleChangedPayload { style: *style }),
            ContentEvent::Backend(event) => event.0.clone(),
        }
    }
}

/// One native top-level window.
pub trait WindowSurface: Send {
    fn show(&self) -> Result<(), HostError>;
    fn hide(&self) -> Result<(), HostError>;
    /// Ask the window to close; the native close-requested path still runs.
    fn request_close(&self) -> Result<(), HostError>;
    fn bounds(&self) -> Result<Bounds, HostError>;
    fn emit(&self, event: &ContentEvent) -> Result<(), HostError>;
    /// Turn the native translucency effect on or off.
    fn set_native_effect(&self, enabled: bool) -> Result<(), HostError>;
}

/// Builds native windows.
pub trait WindowFactory: Send {
    /// Construct a hidden window. It is shown later via `WindowSurface::show`.
    fn build(&self, spec: &WindowSpec) -> Result<Box<dyn WindowSurface>, HostError>;

    /// Whether native translucency exists on this platform. Asked once.
    fn supports_native_effect(&self) -> bool;
}

/// Visibility transitions reported to the tray icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VisibilityChange {
    Hidden { id: WindowId },
    Shown { id: WindowId },
    Closed { id: WindowId },
}

/// Snapshot sent with every visibility notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityState {
    pub change: VisibilityChange,
    pub live_windows: usize,
    pub hidden_windows: usize,
}

/// External tray-icon controller. Only told about changes, never asked.
pub trait TrayController: Send {
    fn visibility_changed(&self, state: VisibilityState);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_event_payloads() {
        let style = ContentEvent::StyleChanged(UiStyle::Glass);
        assert_eq!(style.name(), "style-changed");
        assert_eq!(style.payload(), json!({ "style": "glass" }));

        let indicator = ContentEvent::DropIndicator { visible: true };
        assert_eq!(indicator.payload(), json!({ "visible": true }));

        let backend = ContentEvent::Backend(BackendEvent(json!({ "type": "changed", "path": "/a" })));
        assert_eq!(backend.name(), "backend-event");
        assert_eq!(backend.payload()["path"], "/a");
    }

    #[test]
    fn tab_payload_is_camel_case() {
        let tab = TabData::open("/srv");
        let payload = ContentEvent::TabReceived(tab).payload();
        assert_eq!(payload["historyIndex"], 0);
        assert_eq!(payload["title"], "srv");
    }
}
