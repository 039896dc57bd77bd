// Configuration loading

pub mod error;
pub mod keybindings;
pub mod settings;

use std::path::PathBuf;

pub use error::ConfigError;
pub use keybindings::KeybindingManager;
pub use settings::{ModifierStyle, Settings};

/// Directory holding `settings.json` and `keybindings.json`.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sheetcraft")
}

/// Drop whole-line `//` comments so annotated JSON files parse.
pub(crate) fn strip_comments(contents: &str) -> String {
    contents
        .lines()
        .filter(|line| !line.trim().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}
