use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::host::ContentEvent;
use crate::state::window::WindowHandle;
use crate::state::WindowRegistry;

/// Process-wide visual mode.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UiStyle {
    #[default]
    Classic,
    Glass,
}

impl UiStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            UiStyle::Classic => "classic",
            UiStyle::Glass => "glass",
        }
    }
}

/// Holds the current style and pushes it to every window.
pub struct StyleCoordinator {
    current: UiStyle,
    native_effects: bool,
}

impl StyleCoordinator {
    /// `native_effects` is the platform capability, decided once here.
    pub fn new(native_effects: bool) -> Self {
        if !native_effects {
            info!("native translucency unavailable, glass is rendered by content");
        }
        Self {
            current: UiStyle::default(),
            native_effects,
        }
    }

    pub fn current(&self) -> UiStyle {
        self.current
    }

    /// Store `style` and re-apply it to every registered window.
    pub fn set_style(&mut self, style: UiStyle, registry: &WindowRegistry) {
        if self.current != style {
            info!(from = self.current.as_str(), to = style.as_str(), "ui style changed");
        }
        self.current = style;

        for window in registry.iter().filter(|w| w.is_live()) {
            self.apply_native(window);
            // Content that is still loading gets the style on readiness.
            if window.ready {
                self.announce(window);
            }
        }
    }

    /// Native half of the style for a window. Failures only degrade visuals.
    pub fn apply_native(&self, window: &WindowHandle) {
        if !self.native_effects {
            return;
        }
        let enabled = self.current == UiStyle::Glass;
        if let Err(e) = window.surface.set_native_effect(enabled) {
            warn!(window = %window.id, enabled, "native effect failed, falling back to solid background: {e}");
        }
    }

    /// Tell the window's content which style is current.
    pub fn announce(&self, window: &WindowHandle) {
        if let Err(e) = window
            .surface
            .emit(&ContentEvent::StyleChanged(self.current))
        {
            debug!(window = %window.id, "style-changed not delivered: {e}");
        }
    }
}
