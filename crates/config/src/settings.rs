// Application settings
// Loaded from ~/.config/sheetcraft/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Keyboard modifier style preference (primarily for macOS users)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierStyle {
    /// Cmd and Ctrl both trigger shortcuts
    #[default]
    Platform,
    /// Only Ctrl triggers shortcuts
    Ctrl,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Grid
    #[serde(rename = "grid.defaultColumnWidth")]
    pub default_column_width: f32,

    #[serde(rename = "grid.minRowHeight")]
    pub min_row_height: f32,

    #[serde(rename = "grid.lineHeight")]
    pub line_height: f32,

    #[serde(rename = "grid.rowPadding")]
    pub row_padding: f32,

    #[serde(rename = "grid.blankRows")]
    pub blank_rows: usize,

    #[serde(rename = "grid.blankColumns")]
    pub blank_columns: usize,

    // Editor
    #[serde(rename = "editor.fontSize")]
    pub font_size: f32,

    // History
    #[serde(rename = "history.limit")]
    pub history_limit: usize, // 0 = unlimited

    // Keyboard
    #[serde(rename = "keyboard.modifierStyle")]
    pub modifier_style: ModifierStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_column_width: 150.0,
            min_row_height: 36.0,
            line_height: 20.0,
            row_padding: 16.0,
            blank_rows: 50,
            blank_columns: 26,
            font_size: 12.0,
            history_limit: 100,
            modifier_style: ModifierStyle::default(),
        }
    }
}

const DEFAULT_FILE: &str = r#"{
    // Grid layout (pixels)
    "grid.defaultColumnWidth": 150,
    "grid.minRowHeight": 36,
    "grid.lineHeight": 20,
    "grid.rowPadding": 16,

    // Size of the blank template
    "grid.blankRows": 50,
    "grid.blankColumns": 26,

    // Editor
    "editor.fontSize": 12,

    // Undo history entries kept (0 = unlimited)
    "history.limit": 100,

    // "platform" = Cmd or Ctrl, "ctrl" = Ctrl only
    "keyboard.modifierStyle": "platform"
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        crate::config_dir().join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. A missing file is created with defaults;
    /// unreadable or malformed files log a warning and yield defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            if let Err(e) = Self::write_default_file(path) {
                log::warn!("{}", e);
            }
            return Self::default();
        }

        match Self::try_load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    pub fn try_load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&crate::strip_comments(&contents)).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Save current settings to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        write_file(path, &json)
    }

    /// Create the default settings file with comments
    fn write_default_file(path: &Path) -> Result<(), ConfigError> {
        log::info!("writing default settings to {}", path.display());
        write_file(path, DEFAULT_FILE)
    }
}

pub(crate) fn write_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    // Ensure directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}
