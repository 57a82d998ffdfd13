use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::ShellError;
use crate::host::ContentEvent;
use crate::state::WindowRegistry;

/// Filesystem-change notification from the backend. Passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendEvent(pub serde_json::Value);

/// Slots between the backend reader and the bridge. The reader waits while
/// one event is in flight.
pub const BRIDGE_CAPACITY: usize = 1;

/// Republishes the backend stream to every registered window.
pub struct EventBridge {
    events: mpsc::Receiver<BackendEvent>,
}

impl EventBridge {
    /// Take ownership of the one backend subscription.
    pub fn subscribe(events: mpsc::Receiver<BackendEvent>) -> Self {
        Self { events }
    }

    /// Pass events to `deliver` one at a time, in arrival order, until the
    /// stream ends or delivery becomes impossible. The next event is not
    /// taken until the previous delivery has finished.
    pub async fn run<F, Fut>(mut self, mut deliver: F)
    where
        F: FnMut(BackendEvent) -> Fut,
        Fut: Future<Output = Result<(), ShellError>>,
    {
        info!("event bridge running");
        while let Some(event) = self.events.recv().await {
            if let Err(e) = deliver(event).await {
                error!("stopping event bridge: {e}");
                return;
            }
        }
        info!("backend event stream closed");
    }
}

/// Send one event to each live window. Returns how many accepted it.
pub fn fan_out(registry: &WindowRegistry, event: &BackendEvent) -> usize {
    let content = ContentEvent::Backend(event.clone());
    let mut delivered = 0;
    for window in registry.iter().filter(|w| w.is_live()) {
        match window.surface.emit(&content) {
            Ok(()) => delivered += 1,
            // Window is going away; nothing to do.
            Err(e) => debug!(window = %window.id, "backend event dropped: {e}"),
        }
    }
    delivered
}
