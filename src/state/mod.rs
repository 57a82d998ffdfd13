use std::collections::BTreeMap;

use tracing::{debug, warn};

use self::tab::TabData;
use self::window::{Bounds, Point, WindowHandle, WindowId, WindowPhase};
use crate::error::ShellError;
use crate::host::{WindowFactory, WindowSpec};
use crate::shell::style::UiStyle;

pub mod tab;
pub mod window;

/// Owns every live window. The only place a window list is kept.
pub struct WindowRegistry {
    windows: BTreeMap<WindowId, WindowHandle>,
    next_id: u64,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self {
            windows: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Construct a hidden window and register it.
    ///
    /// The id is consumed even if native construction fails, so ids are
    /// never handed out twice. `initial_tab` is held back until the window's
    /// content reports ready.
    pub fn create(
        &mut self,
        factory: &dyn WindowFactory,
        origin: Option<Point>,
        initial_tab: Option<TabData>,
        style: UiStyle,
    ) -> Result<WindowId, ShellError> {
        let id = WindowId(self.next_id);
        self.next_id += 1;

        let spec = WindowSpec {
            id,
            label: id.label(),
            origin,
            style,
        };
        let surface = factory.build(&spec)?;

        debug!(window = %id, ?origin, seeded = initial_tab.is_some(), "window created");
        self.windows.insert(
            id,
            WindowHandle {
                id,
                phase: WindowPhase::Loading,
                ready: false,
                pending_tabs: initial_tab.map(TabData::normalized).into_iter().collect(),
                surface,
            },
        );
        Ok(id)
    }

    pub fn get(&self, id: WindowId) -> Option<&WindowHandle> {
        self.windows.get(&id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut WindowHandle> {
        self.windows.get_mut(&id)
    }

    /// A window that exists and is not on its way out
    pub fn get_live(&self, id: WindowId) -> Option<&WindowHandle> {
        self.windows.get(&id).filter(|w| w.is_live())
    }

    pub fn list(&self) -> Vec<WindowId> {
        self.windows.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WindowHandle> {
        self.windows.values()
    }

    pub fn live_count(&self) -> usize {
        self.windows.values().filter(|w| w.is_live()).count()
    }

    pub fn hidden_count(&self) -> usize {
        self.windows
            .values()
            .filter(|w| w.phase == WindowPhase::Hidden)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Request close on every window. Destruction is reported later via `remove`.
    pub fn close_all(&mut self) {
        for window in self.windows.values_mut() {
            if window.phase == WindowPhase::Closing {
                continue;
            }
            window.phase = WindowPhase::Closing;
            if let Err(e) = window.surface.request_close() {
                warn!(window = %window.id, "close request failed: {e}");
            }
        }
    }

    /// Deregister a window that finished closing.
    pub fn remove(&mut self, id: WindowId) -> Option<WindowHandle> {
        let removed = self.windows.remove(&id);
        if removed.is_some() {
            debug!(window = %id, remaining = self.windows.len(), "window removed");
        }
        removed
    }

    /// Current on-screen rectangles, queried from the native windows.
    /// Windows that cannot report bounds are left out.
    pub fn bounds(&self) -> BTreeMap<WindowId, Bounds> {
        self.windows
            .values()
            .filter(|w| w.is_live())
            .filter_map(|w| match w.surface.bounds() {
                Ok(bounds) => Some((w.id, bounds)),
                Err(e) => {
                    debug!(window = %w.id, "bounds unavailable: {e}");
                    None
                }
            })
            .collect()
    }
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{Call, RecordingFactory};
    use std::collections::BTreeSet;

    fn create(registry: &mut WindowRegistry, factory: &RecordingFactory) -> WindowId {
        registry
            .create(factory, None, None, UiStyle::Classic)
            .unwrap()
    }

    #[test]
    fn list_tracks_exactly_the_unremoved_ids() {
        let factory = RecordingFactory::new();
        let mut registry = WindowRegistry::new();
        let mut expected = BTreeSet::new();
        let mut issued = BTreeSet::new();

        // Interleave creates and removes, checking the invariant at every step.
        for round in 0..20u64 {
            let id = create(&mut registry, &factory);
            assert!(issued.insert(id), "id {id} issued twice");
            expected.insert(id);

            if round % 3 == 2 {
                let victim = *expected.iter().next().unwrap();
                assert!(registry.remove(victim).is_some());
                expected.remove(&victim);
            }

            let listed: BTreeSet<_> = registry.list().into_iter().collect();
            assert_eq!(listed, expected);
        }
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let factory = RecordingFactory::new();
        let mut registry = WindowRegistry::new();
        let first = create(&mut registry, &factory);
        registry.remove(first);
        let second = create(&mut registry, &factory);
        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
    }

    #[test]
    fn new_windows_start_hidden_with_seed_pending() {
        let factory = RecordingFactory::new();
        let mut registry = WindowRegistry::new();
        let tab = TabData::open("/tmp");
        let id = registry
            .create(&factory, Some(Point { x: 10.0, y: 20.0 }), Some(tab.clone()), UiStyle::Classic)
            .unwrap();

        let handle = registry.get(id).unwrap();
        assert_eq!(handle.phase, WindowPhase::Loading);
        assert!(!handle.ready);
        assert_eq!(handle.pending_tabs, vec![tab]);
        assert_eq!(factory.spec(id).origin, Some(Point { x: 10.0, y: 20.0 }));
        // Nothing reaches the content before it is ready.
        assert!(factory.calls(id).is_empty());
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut registry = WindowRegistry::new();
        assert!(registry.remove(WindowId(99)).is_none());
    }

    #[test]
    fn close_all_requests_close_once_per_window() {
        let factory = RecordingFactory::new();
        let mut registry = WindowRegistry::new();
        let a = create(&mut registry, &factory);
        let b = create(&mut registry, &factory);

        registry.close_all();
        registry.close_all();

        assert_eq!(factory.calls(a), vec![Call::RequestClose]);
        assert_eq!(factory.calls(b), vec![Call::RequestClose]);
        assert_eq!(registry.live_count(), 0);
        // Still registered until destruction is reported.
        assert_eq!(registry.list(), vec![a, b]);
    }

    #[test]
    fn bounds_skips_windows_without_geometry() {
        let factory = RecordingFactory::new();
        let mut registry = WindowRegistry::new();
        let a = create(&mut registry, &factory);
        let b = create(&mut registry, &factory);
        let rect = Bounds {
            x: 0.0,
            y: 0.0,
            width: 800.0,
            height: 600.0,
        };
        factory.set_bounds(a, rect);

        let bounds = registry.bounds();
        assert_eq!(bounds.get(&a), Some(&rect));
        assert!(!bounds.contains_key(&b));
    }
}
