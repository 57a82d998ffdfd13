// Tab drag state machine: idle -> dragging -> idle.
// Delivery and window creation happen in `Shell::complete_drag`.

use serde::Serialize;
use tracing::debug;

use crate::error::ShellError;
use crate::state::tab::TabData;
use crate::state::window::{Point, WindowId};
use crate::state::WindowRegistry;

/// An in-progress tab drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub source: WindowId,
    pub tab: TabData,
    /// Last reported pointer position, screen coordinates
    pub pointer: Point,
}

#[derive(Debug, Default)]
enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Where a dropped tab ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "window", rename_all = "camelCase")]
pub enum DropOutcome {
    /// Handed to an existing window
    Delivered(WindowId),
    /// A new window was created for it
    Spawned(WindowId),
}

#[derive(Debug, Default)]
pub struct TabTransfer {
    state: DragState,
}

impl TabTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a drag session. Only one may be active at a time; a second
    /// request is rejected and the running session is left untouched.
    pub fn begin(&mut self, source: WindowId, tab: TabData, pointer: Point) -> Result<(), ShellError> {
        if let DragState::Dragging(active) = &self.state {
            debug!(active_source = %active.source, requested_source = %source, "drag rejected");
            return Err(ShellError::DragInProgress);
        }
        debug!(window = %source, tab = %tab.id, "drag started");
        self.state = DragState::Dragging(DragSession {
            source,
            tab,
            pointer,
        });
        Ok(())
    }

    pub fn update_pointer(&mut self, pointer: Point) -> Result<(), ShellError> {
        match &mut self.state {
            DragState::Dragging(session) => {
                session.pointer = pointer;
                Ok(())
            }
            DragState::Idle => Err(ShellError::NoActiveDrag),
        }
    }

    /// Drop the session without moving anything.
    pub fn cancel(&mut self) -> Option<DragSession> {
        let session = self.take();
        if let Some(session) = &session {
            debug!(window = %session.source, tab = %session.tab.id, "drag cancelled");
        }
        session
    }

    /// End the session so the drop can be carried out.
    pub fn take(&mut self) -> Option<DragSession> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    #[cfg(test)]
    pub fn is_dragging(&self) -> bool {
        self.session().is_some()
    }
}

/// A drop target only counts if it is still a live window.
pub fn resolve_target(registry: &WindowRegistry, target: Option<WindowId>) -> Option<WindowId> {
    let target = target?;
    match registry.get_live(target) {
        Some(window) => Some(window.id),
        None => {
            debug!(window = %target, "drop target gone, spawning a window instead");
            None
        }
    }
}
