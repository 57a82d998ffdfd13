use std::fmt;

use serde::{Deserialize, Serialize};

use super::tab::TabData;
use crate::host::WindowSurface;

const LABEL_PREFIX: &str = "explorer-";

/// Process-unique window identity. Never reused.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl WindowId {
    /// Native label used for the Tauri window (`explorer-<id>`).
    pub fn label(self) -> String {
        format!("{}{}", LABEL_PREFIX, self.0)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        label
            .strip_prefix(LABEL_PREFIX)
            .and_then(|raw| raw.parse().ok())
            .map(WindowId)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in logical screen coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// On-screen rectangle of a window, logical pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum WindowPhase {
    /// Constructed but hidden until the content signals readiness
    Loading,
    Visible,
    /// Hidden by the close-to-tray rule
    Hidden,
    /// Close dispatched, waiting for the native destroy
    Closing,
}

/// A live window owned by the registry.
pub struct WindowHandle {
    pub id: WindowId,
    pub phase: WindowPhase,
    /// Content has attached its listeners. Independent of visibility: a
    /// window can be parked in the tray before it ever loads.
    pub ready: bool,
    /// Tabs held back until the content is ready
    pub pending_tabs: Vec<TabData>,
    pub surface: Box<dyn WindowSurface>,
}

impl WindowHandle {
    /// Whether the window still takes part in fan-out and counts as live.
    pub fn is_live(&self) -> bool {
        self.phase != WindowPhase::Closing
    }
}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowHandle")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("ready", &self.ready)
            .field("pending_tabs", &self.pending_tabs.len())
            .finish()
    }
}
