mod backend;
mod config;
mod error;
mod host;
mod logging;
mod shell;
mod state;

use std::collections::BTreeMap;
use std::sync::Mutex;

use tauri::{AppHandle, Manager, WebviewWindow, WindowEvent};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use config::BackendConfig;
use error::ShellError;
use host::native::{TauriTray, TauriWindows, MENU_QUIT, MENU_SHOW};
use shell::bridge::{EventBridge, BRIDGE_CAPACITY};
use shell::style::UiStyle;
use shell::transfer::DropOutcome;
use shell::tray::CloseDecision;
use shell::Shell;
use state::tab::TabData;
use state::window::{Bounds, Point, WindowId};

/// All shell state. Only ever locked on the event-loop thread.
struct ShellState(Mutex<Shell>);

impl ShellState {
    fn with<T>(&self, f: impl FnOnce(&mut Shell) -> T) -> Result<T, ShellError> {
        let mut shell = self.0.lock().map_err(|e| ShellError::Lock(e.to_string()))?;
        Ok(f(&mut shell))
    }
}

/// Run `f` against the shell on the event-loop thread and wait for its result.
///
/// Native window calls made from other threads block on the event loop, which
/// may itself be waiting for the shell lock in a window-event callback.
async fn on_main<T, F>(app: &AppHandle, f: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&mut Shell) -> Result<T, ShellError> + Send + 'static,
{
    let (reply, result) = oneshot::channel();
    let handle = app.clone();
    app.run_on_main_thread(move || {
        let outcome = match handle.try_state::<ShellState>() {
            Some(state) => state.with(f).and_then(|r| r),
            None => Err(ShellError::Lock("shell not initialised".into())),
        };
        let _ = reply.send(outcome);
    })
    .map_err(|e| e.to_string())?;

    result
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}

fn window_id(label: &str) -> Result<WindowId, String> {
    WindowId::from_label(label)
        .ok_or_else(|| ShellError::InvalidLabel(label.to_string()).to_string())
}

// ===== Window Commands =====

/// Content layer is listening; show the window and deliver its seed tab.
#[tauri::command]
async fn window_ready(window: WebviewWindow, app: AppHandle) -> Result<(), String> {
    let id = window_id(window.label())?;
    on_main(&app, move |shell| shell.window_ready(id)).await
}

#[tauri::command]
async fn open_window(path: Option<String>, app: AppHandle) -> Result<WindowId, String> {
    let tab = path.map(TabData::open);
    on_main(&app, move |shell| shell.create_window(None, tab)).await
}

#[tauri::command]
async fn list_windows(app: AppHandle) -> Result<Vec<WindowId>, String> {
    on_main(&app, |shell| Ok(shell.registry().list())).await
}

#[tauri::command]
async fn show_windows(app: AppHandle) -> Result<usize, String> {
    on_main(&app, |shell| Ok(shell.show_hidden())).await
}

#[tauri::command]
async fn close_all_windows(app: AppHandle) -> Result<(), String> {
    let empty = on_main(&app, |shell| Ok(close_all(shell))).await?;
    if empty {
        app.exit(0);
    }
    Ok(())
}

#[tauri::command]
async fn set_close_to_tray(enabled: bool, app: AppHandle) -> Result<(), String> {
    on_main(&app, move |shell| {
        shell.set_close_to_tray(enabled);
        Ok(())
    })
    .await
}

// ===== Style Commands =====

#[tauri::command]
async fn set_ui_style(style: UiStyle, app: AppHandle) -> Result<(), String> {
    on_main(&app, move |shell| {
        shell.set_style(style);
        Ok(())
    })
    .await
}

#[tauri::command]
async fn get_ui_style(app: AppHandle) -> Result<UiStyle, String> {
    on_main(&app, |shell| Ok(shell.style())).await
}

// ===== Tab Transfer Commands =====

#[tauri::command]
async fn begin_tab_drag(
    window: WebviewWindow,
    tab: TabData,
    x: f64,
    y: f64,
    app: AppHandle,
) -> Result<(), String> {
    let source = window_id(window.label())?;
    on_main(&app, move |shell| shell.begin_drag(source, tab, Point { x, y })).await
}

#[tauri::command]
async fn update_tab_drag(x: f64, y: f64, app: AppHandle) -> Result<(), String> {
    on_main(&app, move |shell| shell.update_drag(Point { x, y })).await
}

#[tauri::command]
async fn cancel_tab_drag(app: AppHandle) -> Result<bool, String> {
    on_main(&app, |shell| Ok(shell.cancel_drag())).await
}

/// Rectangles of all windows, for hit-testing the drop target.
#[tauri::command]
async fn window_bounds(app: AppHandle) -> Result<BTreeMap<WindowId, Bounds>, String> {
    on_main(&app, |shell| Ok(shell.window_bounds())).await
}

#[tauri::command]
async fn set_drop_indicator(target: u64, visible: bool, app: AppHandle) -> Result<(), String> {
    on_main(&app, move |shell| {
        shell.set_drop_indicator(WindowId(target), visible);
        Ok(())
    })
    .await
}

/// The source has already removed `tab` from its own set.
#[tauri::command]
async fn complete_tab_drag(
    target: Option<u64>,
    tab: TabData,
    app: AppHandle,
) -> Result<DropOutcome, String> {
    on_main(&app, move |shell| shell.complete_drag(target.map(WindowId), tab)).await
}

// ===== Event loop callbacks =====

/// Request close everywhere. True if nothing is left open.
fn close_all(shell: &mut Shell) -> bool {
    shell.close_all();
    shell.registry().is_empty()
}

fn on_tray_menu(app: &AppHandle, item: &str) {
    let Some(state) = app.try_state::<ShellState>() else {
        return;
    };
    match item {
        MENU_SHOW => match state.with(|shell| shell.show_hidden()) {
            Ok(shown) => debug!(shown, "restored hidden windows"),
            Err(e) => error!("tray show failed: {e}"),
        },
        MENU_QUIT => match state.with(close_all) {
            // Lock is released before exiting; exit tears windows down inline.
            Ok(true) => app.exit(0),
            Ok(false) => {}
            Err(e) => error!("tray quit failed: {e}"),
        },
        other => debug!(item = other, "unknown tray menu item"),
    }
}

fn on_window_event(window: &tauri::Window, event: &WindowEvent) {
    let Some(id) = WindowId::from_label(window.label()) else {
        return;
    };
    let Some(state) = window.try_state::<ShellState>() else {
        return;
    };

    match event {
        WindowEvent::CloseRequested { api, .. } => {
            match state.with(|shell| shell.handle_close_request(id)) {
                Ok(CloseDecision::HideToTray) => api.prevent_close(),
                Ok(CloseDecision::Proceed) => {}
                Err(e) => error!(window = %id, "close request not handled: {e}"),
            }
        }
        WindowEvent::Destroyed => {
            if let Err(e) = state.with(|shell| shell.window_destroyed(id)) {
                error!(window = %id, "window teardown not recorded: {e}");
            }
        }
        _ => {}
    }
}

/// Wire the backend stream through the bridge. Each event is delivered on the
/// event-loop thread, in arrival order, and the next one is read only after
/// that delivery has finished.
fn start_event_bridge(app: &AppHandle, backend: BackendConfig) {
    if backend.command.is_none() {
        info!("no backend configured, event bridge idle");
        return;
    }

    let (tx, rx) = mpsc::channel(BRIDGE_CAPACITY);
    let handle = app.clone();
    tauri::async_runtime::spawn(EventBridge::subscribe(rx).run(move |event| {
        let handle = handle.clone();
        async move {
            let delivered = on_main(&handle, move |shell| Ok(shell.broadcast(&event)))
                .await
                .map_err(ShellError::Backend)?;
            debug!(delivered, "backend event fanned out");
            Ok(())
        }
    }));

    tauri::async_runtime::spawn(async move {
        if let Err(e) = backend::run(backend, tx).await {
            error!("backend stopped: {e}");
        }
    });
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    logging::init();

    let config = config::load_default().unwrap_or_else(|e| {
        warn!("falling back to default config: {e}");
        config::ShellConfig::default()
    });

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(move |app| {
            let handle = app.handle().clone();
            let windows = TauriWindows::new(handle.clone(), config.window.clone());
            let tray = TauriTray::install(&handle, on_tray_menu)?;

            let mut shell = Shell::new(Box::new(windows), Box::new(tray), config.close_to_tray);
            shell.create_window(None, None)?;
            app.manage(ShellState(Mutex::new(shell)));

            start_event_bridge(&handle, config.backend.clone());
            info!("shell initialised");
            Ok(())
        })
        .on_window_event(on_window_event)
        .invoke_handler(tauri::generate_handler![
            // Windows
            window_ready,
            open_window,
            list_windows,
            show_windows,
            close_all_windows,
            set_close_to_tray,
            // Style
            set_ui_style,
            get_ui_style,
            // Tab transfer
            begin_tab_drag,
            update_tab_drag,
            cancel_tab_drag,
            window_bounds,
            set_drop_indicator,
            complete_tab_drag,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
