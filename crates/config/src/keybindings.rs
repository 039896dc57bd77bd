// Keybinding configuration
// User overrides live in ~/.config/sheetcraft/keybindings.json

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::settings::{write_file, ModifierStyle};

/// Command ids a binding may name.
pub const COMMANDS: &[&str] = &[
    "edit.undo",
    "edit.redo",
    "edit.copy",
    "edit.cut",
    "edit.paste",
    "format.bold",
    "format.italic",
    "format.underline",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keybinding {
    pub key: String,
    pub command: String,
}

impl Keybinding {
    fn new(key: &str, command: &str) -> Self {
        Self {
            key: key.to_string(),
            command: command.to_string(),
        }
    }
}

pub fn default_keybindings() -> Vec<Keybinding> {
    vec![
        Keybinding::new("Ctrl+Z", "edit.undo"),
        Keybinding::new("Ctrl+Shift+Z", "edit.redo"),
        Keybinding::new("Ctrl+Y", "edit.redo"),
        Keybinding::new("Ctrl+C", "edit.copy"),
        Keybinding::new("Ctrl+X", "edit.cut"),
        Keybinding::new("Ctrl+V", "edit.paste"),
        Keybinding::new("Ctrl+B", "format.bold"),
        Keybinding::new("Ctrl+I", "format.italic"),
        Keybinding::new("Ctrl+U", "format.underline"),
    ]
}

const DEFAULT_FILE: &str = r#"[
    // Custom keybindings - these override defaults
    // Format: { "key": "Ctrl+Key", "command": "command.id" }
    //
    // Available commands:
    //   edit.undo, edit.redo, edit.copy, edit.cut, edit.paste
    //   format.bold, format.italic, format.underline
    //
    // Example custom binding:
    // { "key": "Alt+B", "command": "format.bold" }
]
"#;

#[derive(Debug, Clone)]
pub struct KeybindingManager {
    // Maps normalized key combo -> command id
    bindings: HashMap<String, String>,
    // Maps command id -> key combo (for display)
    shortcuts: HashMap<String, String>,
    modifier_style: ModifierStyle,
    config_path: PathBuf,
}

impl KeybindingManager {
    /// Defaults plus the user's file from the config directory.
    pub fn new(modifier_style: ModifierStyle) -> Self {
        Self::load_from(&crate::config_dir().join("keybindings.json"), modifier_style)
    }

    /// Defaults only; no file is read or written.
    pub fn with_defaults(modifier_style: ModifierStyle) -> Self {
        let mut manager = Self {
            bindings: HashMap::new(),
            shortcuts: HashMap::new(),
            modifier_style,
            config_path: PathBuf::new(),
        };
        for binding in default_keybindings() {
            // Defaults are known-good
            let _ = manager.bind(&binding.key, &binding.command);
        }
        manager
    }

    /// Defaults overlaid with the bindings in `path`. A missing file is
    /// created with an empty, commented list.
    pub fn load_from(path: &Path, modifier_style: ModifierStyle) -> Self {
        let mut manager = Self::with_defaults(modifier_style);
        manager.config_path = path.to_path_buf();

        if !path.exists() {
            if let Err(e) = write_file(path, DEFAULT_FILE) {
                log::warn!("{}", e);
            }
            return manager;
        }

        match Self::read_user_bindings(path) {
            Ok(user_bindings) => {
                for binding in user_bindings {
                    if let Err(e) = manager.bind(&binding.key, &binding.command) {
                        log::warn!("{}: skipping binding: {}", path.display(), e);
                    }
                }
            }
            Err(e) => log::warn!("{}", e),
        }
        manager
    }

    fn read_user_bindings(path: &Path) -> Result<Vec<Keybinding>, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&crate::strip_comments(&contents)).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Add or replace a binding.
    pub fn bind(&mut self, key: &str, command: &str) -> Result<(), ConfigError> {
        if !COMMANDS.contains(&command) {
            return Err(ConfigError::UnknownCommand(command.to_string()));
        }
        let normalized = self
            .normalize_key(key)
            .ok_or_else(|| ConfigError::InvalidChord(key.to_string()))?;
        self.shortcuts.insert(command.to_string(), key.to_string());
        self.bindings.insert(normalized, command.to_string());
        Ok(())
    }

    /// Normalize key string to canonical form: "ctrl+shift+alt+key".
    ///
    /// Cmd/Meta/Super count as Ctrl under the platform style. Under the
    /// ctrl style they are not shortcut modifiers and the chord yields `None`.
    pub fn normalize_key(&self, key: &str) -> Option<String> {
        let key = key.to_lowercase();

        let mut has_ctrl = false;
        let mut has_shift = false;
        let mut has_alt = false;
        let mut main_key = "";

        for part in key.split('+') {
            match part.trim() {
                "ctrl" | "control" => has_ctrl = true,
                "cmd" | "command" | "meta" | "super" => match self.modifier_style {
                    ModifierStyle::Platform => has_ctrl = true,
                    ModifierStyle::Ctrl => return None,
                },
                "shift" => has_shift = true,
                "alt" | "option" => has_alt = true,
                "" => {}
                other => main_key = other,
            }
        }
        if main_key.is_empty() {
            return None;
        }

        let mut result = String::new();
        if has_ctrl {
            result.push_str("ctrl+");
        }
        if has_shift {
            result.push_str("shift+");
        }
        if has_alt {
            result.push_str("alt+");
        }
        result.push_str(main_key);
        Some(result)
    }

    /// Get command for a key combination
    pub fn get_command(&self, key: &str) -> Option<&str> {
        let normalized = self.normalize_key(key)?;
        self.bindings.get(&normalized).map(String::as_str)
    }

    /// Get shortcut display string for a command, using Cmd on macOS when
    /// the platform style is active.
    pub fn get_shortcut(&self, command: &str) -> Option<String> {
        let shortcut = self.shortcuts.get(command)?;
        if cfg!(target_os = "macos") && self.modifier_style == ModifierStyle::Platform {
            Some(shortcut.replace("Ctrl", "Cmd").replace("ctrl", "cmd"))
        } else {
            Some(shortcut.clone())
        }
    }

    /// `(normalized chord, command id)` pairs, sorted by chord.
    pub fn bindings(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self
            .bindings
            .iter()
            .map(|(k, c)| (k.clone(), c.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    pub fn modifier_style(&self) -> ModifierStyle {
        self.modifier_style
    }

    /// Get config file path for display
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
