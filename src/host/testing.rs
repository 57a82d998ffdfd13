// In-memory window layer that records every call the shell makes.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{
    ContentEvent, TrayController, VisibilityState, WindowFactory, WindowSpec, WindowSurface,
};
use crate::error::HostError;
use crate::state::tab::TabData;
use crate::state::window::{Bounds, WindowId};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Show,
    Hide,
    RequestClose,
    Effect(bool),
    Emit(ContentEvent),
}

struct Recorded {
    spec: WindowSpec,
    calls: Vec<Call>,
    bounds: Option<Bounds>,
    effect_fails: bool,
}

#[derive(Default)]
struct Log {
    windows: BTreeMap<WindowId, Recorded>,
    built: Vec<WindowId>,
    refuse_builds: bool,
}

#[derive(Clone, Default)]
pub struct RecordingFactory {
    log: Arc<Mutex<Log>>,
    native_effects: bool,
    effect_fails: bool,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native_effects() -> Self {
        Self {
            native_effects: true,
            ..Self::default()
        }
    }

    /// Native effects are reported as supported but every call fails.
    pub fn with_failing_effects() -> Self {
        Self {
            native_effects: true,
            effect_fails: true,
            ..Self::default()
        }
    }

    pub fn built(&self) -> Vec<WindowId> {
        self.log.lock().unwrap().built.clone()
    }

    pub fn spec(&self, id: WindowId) -> WindowSpec {
        self.log.lock().unwrap().windows[&id].spec.clone()
    }

    pub fn calls(&self, id: WindowId) -> Vec<Call> {
        self.log
            .lock()
            .unwrap()
            .windows
            .get(&id)
            .map(|w| w.calls.clone())
            .unwrap_or_default()
    }

    pub fn events(&self, id: WindowId) -> Vec<ContentEvent> {
        self.calls(id)
            .into_iter()
            .filter_map(|call| match call {
                Call::Emit(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    /// Tabs the window's content has been handed.
    pub fn received_tabs(&self, id: WindowId) -> Vec<TabData> {
        self.events(id)
            .into_iter()
            .filter_map(|event| match event {
                ContentEvent::TabReceived(tab) => Some(tab),
                _ => None,
            })
            .collect()
    }

    /// Every later `build` fails, as if the platform refused a new window.
    pub fn refuse_builds(&self) {
        self.log.lock().unwrap().refuse_builds = true;
    }

    pub fn set_bounds(&self, id: WindowId, bounds: Bounds) {
        if let Some(window) = self.log.lock().unwrap().windows.get_mut(&id) {
            window.bounds = Some(bounds);
        }
    }
}

impl WindowFactory for RecordingFactory {
    fn build(&self, spec: &WindowSpec) -> Result<Box<dyn WindowSurface>, HostError> {
        let mut log = self.log.lock().unwrap();
        if log.refuse_builds {
            return Err(HostError::Native("window creation refused".into()));
        }
        log.built.push(spec.id);
        log.windows.insert(
            spec.id,
            Recorded {
                spec: spec.clone(),
                calls: Vec::new(),
                bounds: None,
                effect_fails: self.effect_fails,
            },
        );
        Ok(Box::new(RecordingSurface {
            id: spec.id,
            log: Arc::clone(&self.log),
        }))
    }

    fn supports_native_effect(&self) -> bool {
        self.native_effects
    }
}

struct RecordingSurface {
    id: WindowId,
    log: Arc<Mutex<Log>>,
}

impl RecordingSurface {
    fn record(&self, call: Call) -> Result<(), HostError> {
        let mut log = self.log.lock().unwrap();
        let window = log.windows.get_mut(&self.id).ok_or_else(|| HostError::Native("window destroyed".into()))?;
        if matches!(call, Call::Effect(_)) && window.effect_fails {
            return Err(HostError::Native("effect unavailable".into()));
        }
        window.calls.push(call);
        Ok(())
    }
}

impl WindowSurface for RecordingSurface {
    fn show(&self) -> Result<(), HostError> {
        self.record(Call::Show)
    }

    fn hide(&self) -> Result<(), HostError> {
        self.record(Call::Hide)
    }

    fn request_close(&self) -> Result<(), HostError> {
        self.record(Call::RequestClose)
    }

    fn bounds(&self) -> Result<Bounds, HostError> {
        let log = self.log.lock().unwrap();
        let window = log.windows.get(&self.id).ok_or_else(|| HostError::Native("window destroyed".into()))?;
        window
            .bounds
            .ok_or_else(|| HostError::Native("bounds unavailable".into()))
    }

    fn emit(&self, event: &ContentEvent) -> Result<(), HostError> {
        self.record(Call::Emit(event.clone()))
    }

    fn set_native_effect(&self, enabled: bool) -> Result<(), HostError> {
        self.record(Call::Effect(enabled))
    }
}

#[derive(Clone, Default)]
pub struct RecordingTray {
    notifications: Arc<Mutex<Vec<VisibilityState>>>,
}

impl RecordingTray {
    pub fn notifications(&self) -> Vec<VisibilityState> {
        self.notifications.lock().unwrap().clone()
    }
}

impl TrayController for RecordingTray {
    fn visibility_changed(&self, state: VisibilityState) {
        self.notifications.lock().unwrap().push(state);
    }
}
