use std::path::PathBuf;

use crate::state::tab::TabData;
use crate::state::window::WindowId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not determine config directory")]
    NoConfigDir,
}

/// Failure reported by the native window layer.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("native window error: {0}")]
    Native(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("window {0} not found")]
    WindowNotFound(WindowId),

    #[error("a tab drag is already in progress")]
    DragInProgress,

    #[error("no tab drag is in progress")]
    NoActiveDrag,

    #[error("invalid window label: {0}")]
    InvalidLabel(String),

    /// A dropped tab found no window. The tab travels back to the caller.
    #[error("tab {} could not be placed in any window: {source}", .tab.id)]
    Undelivered {
        tab: Box<TabData>,
        #[source]
        source: Box<ShellError>,
    },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("shell state unavailable: {0}")]
    Lock(String),
}
