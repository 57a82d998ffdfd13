use tracing::debug;

use crate::state::window::WindowId;
use crate::state::WindowRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Keep the window alive and hide it
    HideToTray,
    /// Let the native close go ahead
    Proceed,
}

/// Close-to-tray rule: the last window is hidden instead of destroyed.
#[derive(Debug)]
pub struct TrayPolicy {
    close_to_tray: bool,
    quitting: bool,
}

impl TrayPolicy {
    pub fn new(close_to_tray: bool) -> Self {
        Self {
            close_to_tray,
            quitting: false,
        }
    }

    #[cfg(test)]
    pub fn close_to_tray(&self) -> bool {
        self.close_to_tray
    }

    pub fn set_close_to_tray(&mut self, enabled: bool) {
        self.close_to_tray = enabled;
    }

    /// From here on every close goes through; an app exit is never intercepted.
    pub fn begin_quit(&mut self) {
        self.quitting = true;
    }

    pub fn decide(&self, registry: &WindowRegistry, id: WindowId) -> CloseDecision {
        let last_window = registry.live_count() == 1 && registry.get_live(id).is_some();
        if self.close_to_tray && !self.quitting && last_window {
            debug!(window = %id, "intercepting close of last window");
            CloseDecision::HideToTray
        } else {
            CloseDecision::Proceed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::RecordingFactory;
    use crate::shell::style::UiStyle;

    fn registry_with(count: usize) -> (WindowRegistry, Vec<WindowId>) {
        let factory = RecordingFactory::new();
        let mut registry = WindowRegistry::new();
        let ids = (0..count)
            .map(|_| {
                registry
                    .create(&factory, None, None, UiStyle::Classic)
                    .unwrap()
            })
            .collect();
        (registry, ids)
    }

    #[test]
    fn last_window_is_hidden_when_enabled() {
        let (registry, ids) = registry_with(1);
        let policy = TrayPolicy::new(true);
        assert_eq!(policy.decide(&registry, ids[0]), CloseDecision::HideToTray);
    }

    #[test]
    fn disabled_policy_always_proceeds() {
        let (registry, ids) = registry_with(1);
        let policy = TrayPolicy::new(false);
        assert_eq!(policy.decide(&registry, ids[0]), CloseDecision::Proceed);
    }

    #[test]
    fn one_of_two_windows_closes_normally() {
        let (registry, ids) = registry_with(2);
        let policy = TrayPolicy::new(true);
        assert_eq!(policy.decide(&registry, ids[0]), CloseDecision::Proceed);
    }

    #[test]
    fn quitting_overrides_close_to_tray() {
        let (registry, ids) = registry_with(1);
        let mut policy = TrayPolicy::new(true);
        policy.begin_quit();
        assert_eq!(policy.decide(&registry, ids[0]), CloseDecision::Proceed);
    }

    #[test]
    fn toggle_at_runtime() {
        let (registry, ids) = registry_with(1);
        let mut policy = TrayPolicy::new(false);
        policy.set_close_to_tray(true);
        assert!(policy.close_to_tray());
        assert_eq!(policy.decide(&registry, ids[0]), CloseDecision::HideToTray);
    }
}
