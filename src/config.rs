//! TOML configuration for the shell.
//!
//! Missing fields fall back to serde defaults; a missing file means all
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Hide the last window instead of quitting when it is closed
    pub close_to_tray: bool,
    pub window: WindowConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub min_width: f64,
    pub min_height: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Xplorer".to_string(),
            width: 1100.0,
            height: 700.0,
            min_width: 480.0,
            min_height: 320.0,
        }
    }
}

/// How to start the backend process whose stdout feeds the event bridge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Executable to run; no backend is started when unset
    pub command: Option<String>,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

pub fn load_from_path(path: &Path) -> Result<ShellConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: ShellConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load from the platform config directory, or defaults if there is no file.
///
/// On Linux: `~/.config/xplorer/config.toml`
pub fn load_default() -> Result<ShellConfig, ConfigError> {
    let path = default_config_path()?;
    if !path.exists() {
        info!("no config at {}, using defaults", path.display());
        return Ok(ShellConfig::default());
    }
    load_from_path(&path)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join("xplorer").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = write_config("");
        let config = load_from_path(file.path()).unwrap();
        assert_eq!(config, ShellConfig::default());
        assert!(!config.close_to_tray);
        assert_eq!(config.window.title, "Xplorer");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = write_config(
            r#"
close_to_tray = true

[window]
width = 1280.0

[backend]
command = "python3"
args = ["-m", "xplorer"]
"#,
        );
        let config = load_from_path(file.path()).unwrap();
        assert!(config.close_to_tray);
        assert_eq!(config.window.width, 1280.0);
        assert_eq!(config.window.height, 700.0);
        assert_eq!(config.backend.command.as_deref(), Some("python3"));
        assert_eq!(config.backend.args, vec!["-m", "xplorer"]);
        assert!(config.backend.cwd.is_none());
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let file = write_config("close_to_tray = ");
        assert!(matches!(
            load_from_path(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
