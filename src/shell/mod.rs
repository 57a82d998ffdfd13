// Window orchestration: registry, tab transfer, style, tray and the backend bridge.
// Every entry point runs on the event-loop thread under the single shell lock,
// so fan-out never sees a half-updated registry.

pub mod bridge;
pub mod style;
pub mod transfer;
pub mod tray;

use std::collections::BTreeMap;

use tracing::{debug, error, info, warn};

use self::bridge::BackendEvent;
use self::style::{StyleCoordinator, UiStyle};
use self::transfer::{resolve_target, DropOutcome, TabTransfer};
use self::tray::{CloseDecision, TrayPolicy};
use crate::error::ShellError;
use crate::host::{
    ContentEvent, TrayController, VisibilityChange, VisibilityState, WindowFactory,
};
use crate::state::tab::TabData;
use crate::state::window::{Bounds, Point, WindowHandle, WindowId, WindowPhase};
use crate::state::WindowRegistry;

pub struct Shell {
    registry: WindowRegistry,
    style: StyleCoordinator,
    transfer: TabTransfer,
    tray_policy: TrayPolicy,
    /// Window currently showing the drop affordance
    drop_indicator: Option<WindowId>,
    factory: Box<dyn WindowFactory>,
    tray: Box<dyn TrayController>,
}

impl Shell {
    pub fn new(
        factory: Box<dyn WindowFactory>,
        tray: Box<dyn TrayController>,
        close_to_tray: bool,
    ) -> Self {
        let style = StyleCoordinator::new(factory.supports_native_effect());
        Self {
            registry: WindowRegistry::new(),
            style,
            transfer: TabTransfer::new(),
            tray_policy: TrayPolicy::new(close_to_tray),
            drop_indicator: None,
            factory,
            tray,
        }
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    // ===== Window lifecycle =====

    /// Open a window, hidden until its content calls `window_ready`.
    pub fn create_window(
        &mut self,
        origin: Option<Point>,
        initial_tab: Option<TabData>,
    ) -> Result<WindowId, ShellError> {
        let id = self
            .registry
            .create(self.factory.as_ref(), origin, initial_tab, self.style.current())?;

        if self.style.current() == UiStyle::Glass {
            if let Some(window) = self.registry.get(id) {
                self.style.apply_native(window);
            }
        }
        info!(window = %id, "window opened");
        Ok(id)
    }

    /// Content finished loading: show the window, then hand it the current
    /// style and any tabs it was seeded with. Only the first call counts.
    ///
    /// A window parked in the tray while loading stays hidden but still gets
    /// its style and tabs.
    pub fn window_ready(&mut self, id: WindowId) -> Result<(), ShellError> {
        let window = self
            .registry
            .get_mut(id)
            .ok_or(ShellError::WindowNotFound(id))?;

        if window.ready {
            debug!(window = %id, phase = ?window.phase, "repeated ready signal ignored");
            return Ok(());
        }
        window.ready = true;

        if window.phase == WindowPhase::Loading {
            window.phase = WindowPhase::Visible;
            if let Err(e) = window.surface.show() {
                warn!(window = %id, "failed to show window: {e}");
            }
        }
        self.style.announce(window);
        for tab in std::mem::take(&mut window.pending_tabs) {
            emit_tab(window, tab);
        }
        Ok(())
    }

    /// Request close on every window. Close-to-tray no longer applies.
    pub fn close_all(&mut self) {
        info!(windows = self.registry.live_count(), "closing all windows");
        self.tray_policy.begin_quit();
        self.registry.close_all();
    }

    /// Native close request arrived for `id`.
    pub fn handle_close_request(&mut self, id: WindowId) -> CloseDecision {
        let decision = self.tray_policy.decide(&self.registry, id);
        let Some(window) = self.registry.get_mut(id) else {
            return CloseDecision::Proceed;
        };

        match decision {
            CloseDecision::HideToTray => {
                if let Err(e) = window.surface.hide() {
                    warn!(window = %id, "failed to hide window: {e}");
                }
                window.phase = WindowPhase::Hidden;
                info!(window = %id, "window hidden to tray");
                self.notify_tray(VisibilityChange::Hidden { id });
            }
            CloseDecision::Proceed => {
                window.phase = WindowPhase::Closing;
            }
        }
        decision
    }

    /// The native window is gone.
    pub fn window_destroyed(&mut self, id: WindowId) {
        if self.registry.remove(id).is_none() {
            return;
        }
        if self.drop_indicator == Some(id) {
            self.drop_indicator = None;
        }
        info!(window = %id, remaining = self.registry.live_count(), "window closed");
        self.notify_tray(VisibilityChange::Closed { id });
    }

    /// Bring back every window hidden by the tray rule.
    pub fn show_hidden(&mut self) -> usize {
        let hidden: Vec<WindowId> = self
            .registry
            .iter()
            .filter(|w| w.phase == WindowPhase::Hidden)
            .map(|w| w.id)
            .collect();

        for &id in &hidden {
            if let Some(window) = self.registry.get_mut(id) {
                if let Err(e) = window.surface.show() {
                    warn!(window = %id, "failed to show window: {e}");
                }
                window.phase = WindowPhase::Visible;
            }
            self.notify_tray(VisibilityChange::Shown { id });
        }
        hidden.len()
    }

    pub fn set_close_to_tray(&mut self, enabled: bool) {
        info!(enabled, "close-to-tray updated");
        self.tray_policy.set_close_to_tray(enabled);
    }

    fn notify_tray(&self, change: VisibilityChange) {
        self.tray.visibility_changed(VisibilityState {
            change,
            live_windows: self.registry.live_count(),
            hidden_windows: self.registry.hidden_count(),
        });
    }

    // ===== Style =====

    pub fn style(&self) -> UiStyle {
        self.style.current()
    }

    pub fn set_style(&mut self, style: UiStyle) {
        self.style.set_style(style, &self.registry);
    }

    // ===== Backend events =====

    pub fn broadcast(&self, event: &BackendEvent) -> usize {
        bridge::fan_out(&self.registry, event)
    }

    // ===== Tab transfer =====

    pub fn begin_drag(
        &mut self,
        source: WindowId,
        tab: TabData,
        pointer: Point,
    ) -> Result<(), ShellError> {
        if self.registry.get_live(source).is_none() {
            return Err(ShellError::WindowNotFound(source));
        }
        self.transfer.begin(source, tab, pointer)
    }

    pub fn update_drag(&mut self, pointer: Point) -> Result<(), ShellError> {
        self.transfer.update_pointer(pointer)
    }

    /// Abandon the drag. Nothing moves and no window is created.
    pub fn cancel_drag(&mut self) -> bool {
        self.clear_drop_indicator();
        self.transfer.cancel().is_some()
    }

    /// Rectangles of every window, for the dragging window's hit-testing.
    pub fn window_bounds(&self) -> BTreeMap<WindowId, Bounds> {
        self.registry.bounds()
    }

    /// Toggle the drop affordance on `target`. Unknown targets are ignored.
    pub fn set_drop_indicator(&mut self, target: WindowId, visible: bool) {
        if visible && self.drop_indicator.is_some_and(|current| current != target) {
            self.clear_drop_indicator();
        }

        let Some(window) = self.registry.get_live(target) else {
            return;
        };
        if let Err(e) = window.surface.emit(&ContentEvent::DropIndicator { visible }) {
            debug!(window = %target, "drop indicator not delivered: {e}");
        }
        if visible {
            self.drop_indicator = Some(target);
        } else if self.drop_indicator == Some(target) {
            self.drop_indicator = None;
        }
    }

    fn clear_drop_indicator(&mut self) {
        if let Some(previous) = self.drop_indicator.take() {
            if let Some(window) = self.registry.get_live(previous) {
                if let Err(e) = window
                    .surface
                    .emit(&ContentEvent::DropIndicator { visible: false })
                {
                    debug!(window = %previous, "drop indicator not cleared: {e}");
                }
            }
        }
    }

    /// Hand `tab` to exactly one window.
    ///
    /// A live `target` receives it; otherwise, or if delivery to the target
    /// fails, a new window is opened at the drop point seeded with the tab.
    /// The source window has already removed the tab from its own set, so if
    /// no window can be opened the tab comes back in `ShellError::Undelivered`.
    pub fn complete_drag(
        &mut self,
        target: Option<WindowId>,
        tab: TabData,
    ) -> Result<DropOutcome, ShellError> {
        let session = self.transfer.take();
        self.clear_drop_indicator();
        let drop_point = session.as_ref().map(|s| s.pointer);
        if let Some(session) = session.as_ref().filter(|s| s.tab.id != tab.id) {
            warn!(source = %session.source, dragged = %session.tab.id, dropped = %tab.id, "dropped tab differs from the dragged one");
        }
        let tab = tab.normalized();

        let tab = match resolve_target(&self.registry, target) {
            Some(id) => match self.deliver_tab(id, tab) {
                Ok(()) => {
                    info!(window = %id, "tab delivered");
                    return Ok(DropOutcome::Delivered(id));
                }
                Err(tab) => tab,
            },
            None => tab,
        };

        match self.create_window(drop_point, Some(tab.clone())) {
            Ok(id) => {
                info!(window = %id, "tab moved to new window");
                Ok(DropOutcome::Spawned(id))
            }
            Err(e) => {
                error!(?tab, "no window could take the dropped tab: {e}");
                Err(ShellError::Undelivered {
                    tab: Box::new(tab),
                    source: Box::new(e),
                })
            }
        }
    }

    /// Give the tab back if the window could not take it.
    fn deliver_tab(&mut self, id: WindowId, tab: TabData) -> Result<(), TabData> {
        let Some(window) = self.registry.get_mut(id) else {
            return Err(tab);
        };
        if !window.ready {
            window.pending_tabs.push(tab);
            return Ok(());
        }
        match window.surface.emit(&ContentEvent::TabReceived(tab.clone())) {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(window = %id, "tab delivery failed: {e}");
                Err(tab)
            }
        }
    }
}

fn emit_tab(window: &WindowHandle, tab: TabData) {
    if let Err(e) = window.surface.emit(&ContentEvent::TabReceived(tab)) {
        warn!(window = %window.id, "seeded tab not delivered: {e}");
    }
}
