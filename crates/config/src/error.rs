use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    /// Reading or writing a config file failed.
    Io { path: PathBuf, source: std::io::Error },
    /// A config file is not valid JSON for its schema.
    Parse { path: PathBuf, message: String },
    /// Keybinding names a command that does not exist.
    UnknownCommand(String),
    /// Keybinding chord has no main key.
    InvalidChord(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            Self::Parse { path, message } => write!(f, "error parsing {}: {}", path.display(), message),
            Self::UnknownCommand(id) => write!(f, "unknown command '{}'", id),
            Self::InvalidChord(chord) => write!(f, "invalid key chord '{}'", chord),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
