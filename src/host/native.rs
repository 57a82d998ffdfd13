use tauri::menu::{Menu, MenuItem};
use tauri::tray::TrayIconBuilder;
use tauri::{AppHandle, Emitter, WebviewUrl, WebviewWindow, WebviewWindowBuilder};
use tracing::{debug, info, warn};

#[cfg(target_os = "macos")]
use window_vibrancy::{apply_vibrancy, clear_vibrancy, NSVisualEffectMaterial};

#[cfg(target_os = "windows")]
use window_vibrancy::{apply_acrylic, apply_mica, clear_acrylic, clear_mica};

use super::{
    ContentEvent, TrayController, VisibilityChange, VisibilityState, WindowFactory, WindowSpec,
    WindowSurface,
};
use crate::config::WindowConfig;
use crate::error::HostError;
use crate::state::window::Bounds;

pub const TRAY_ID: &str = "xplorer-tray";
pub const MENU_SHOW: &str = "show";
pub const MENU_QUIT: &str = "quit";

fn native(e: impl std::fmt::Display) -> HostError {
    HostError::Native(e.to_string())
}

/// Builds explorer windows through Tauri.
pub struct TauriWindows {
    app: AppHandle,
    window: WindowConfig,
}

impl TauriWindows {
    pub fn new(app: AppHandle, window: WindowConfig) -> Self {
        Self { app, window }
    }
}

impl WindowFactory for TauriWindows {
    fn build(&self, spec: &WindowSpec) -> Result<Box<dyn WindowSurface>, HostError> {
        // Content paints with this before the first style-changed event.
        let style_hint = format!("window.__XPLORER_STYLE__ = \"{}\";", spec.style.as_str());

        let builder = WebviewWindowBuilder::new(
            &self.app,
            spec.label.clone(),
            WebviewUrl::App("index.html".into()),
        )
        .title(&self.window.title)
        .inner_size(self.window.width, self.window.height)
        .min_inner_size(self.window.min_width, self.window.min_height)
        .visible(false)
        .initialization_script(&style_hint);

        let builder = match spec.origin {
            Some(origin) => builder.position(origin.x, origin.y),
            None => builder.center(),
        };

        let window = builder.build().map_err(native)?;
        debug!(label = %spec.label, "native window built");
        Ok(Box::new(TauriSurface { window }))
    }

    fn supports_native_effect(&self) -> bool {
        cfg!(any(target_os = "macos", target_os = "windows"))
    }
}

struct TauriSurface {
    window: WebviewWindow,
}

impl WindowSurface for TauriSurface {
    fn show(&self) -> Result<(), HostError> {
        self.window.show().map_err(native)?;
        self.window.set_focus().map_err(native)
    }

    fn hide(&self) -> Result<(), HostError> {
        self.window.hide().map_err(native)
    }

    fn request_close(&self) -> Result<(), HostError> {
        // On the event-loop thread `close` runs the close handlers inline, and
        // those take the shell lock our caller holds. Hand it to a worker so
        // the request is queued instead.
        let window = self.window.clone();
        tauri::async_runtime::spawn(async move {
            if let Err(e) = window.close() {
                warn!(label = %window.label(), "close request failed: {e}");
            }
        });
        Ok(())
    }

    fn bounds(&self) -> Result<Bounds, HostError> {
        let scale = self.window.scale_factor().map_err(native)?;
        let position = self
            .window
            .outer_position()
            .map_err(native)?
            .to_logical::<f64>(scale);
        let size = self
            .window
            .outer_size()
            .map_err(native)?
            .to_logical::<f64>(scale);
        Ok(Bounds {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        })
    }

    fn emit(&self, event: &ContentEvent) -> Result<(), HostError> {
        // Targeted at this window only; plain `emit` would reach every window.
        self.window
            .emit_to(self.window.label(), event.name(), event.payload())
            .map_err(native)
    }

    fn set_native_effect(&self, enabled: bool) -> Result<(), HostError> {
        apply_platform_effect(&self.window, enabled)
    }
}

#[cfg(target_os = "macos")]
fn apply_platform_effect(window: &WebviewWindow, enabled: bool) -> Result<(), HostError> {
    if enabled {
        apply_vibrancy(window, NSVisualEffectMaterial::HudWindow, None, None).map_err(native)
    } else {
        clear_vibrancy(window).map(|_| ()).map_err(native)
    }
}

#[cfg(target_os = "windows")]
fn apply_platform_effect(window: &WebviewWindow, enabled: bool) -> Result<(), HostError> {
    if enabled {
        // Mica needs Windows 11; acrylic covers Windows 10.
        if apply_mica(window, None).is_err() {
            apply_acrylic(window, Some((18, 18, 18, 125))).map_err(native)?;
        }
    } else {
        if let Err(e) = clear_mica(window) {
            debug!("mica not cleared: {e}");
        }
        if let Err(e) = clear_acrylic(window) {
            debug!("acrylic not cleared: {e}");
        }
    }
    Ok(())
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn apply_platform_effect(_window: &WebviewWindow, _enabled: bool) -> Result<(), HostError> {
    Err(HostError::Native(
        "no native translucency on this platform".into(),
    ))
}

/// Tray icon that reflects how many windows are tucked away.
pub struct TauriTray {
    app: AppHandle,
}

impl TauriTray {
    /// Create the tray icon with its Show / Quit menu. Menu clicks are
    /// routed to `on_menu`.
    pub fn install<F>(app: &AppHandle, on_menu: F) -> tauri::Result<Self>
    where
        F: Fn(&AppHandle, &str) + Send + Sync + 'static,
    {
        let show = MenuItem::with_id(app, MENU_SHOW, "Show Xplorer", true, None::<&str>)?;
        let quit = MenuItem::with_id(app, MENU_QUIT, "Quit", true, None::<&str>)?;
        let menu = Menu::with_items(app, &[&show, &quit])?;

        let mut builder = TrayIconBuilder::with_id(TRAY_ID)
            .menu(&menu)
            .tooltip("Xplorer")
            .on_menu_event(move |app, event| on_menu(app, event.id.as_ref()));
        if let Some(icon) = app.default_window_icon() {
            builder = builder.icon(icon.clone());
        }
        builder.build(app)?;
        info!("tray icon installed");

        Ok(Self { app: app.clone() })
    }
}

impl TrayController for TauriTray {
    fn visibility_changed(&self, state: VisibilityState) {
        debug!(?state, "tray visibility update");
        let Some(tray) = self.app.tray_by_id(TRAY_ID) else {
            return;
        };

        let tooltip = match state.hidden_windows {
            0 => "Xplorer".to_string(),
            1 => "Xplorer (1 window in tray)".to_string(),
            n => format!("Xplorer ({n} windows in tray)"),
        };
        if let Err(e) = tray.set_tooltip(Some(tooltip)) {
            warn!("failed to update tray tooltip: {e}");
        }

        if let VisibilityChange::Hidden { id } = state.change {
            info!(window = %id, "window parked in tray");
        }
    }
}
