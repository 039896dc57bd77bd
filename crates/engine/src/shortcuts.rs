//! Keyboard chords routed to document commands.
//!
//! The host attaches the dispatcher while the sheet view is mounted and
//! detaches it on unmount. Chords arriving while detached are ignored.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::document::SheetDocument;

/// Editing commands reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Undo,
    Redo,
    Copy,
    Cut,
    Paste,
    Bold,
    Italic,
    Underline,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Undo,
        Command::Redo,
        Command::Copy,
        Command::Cut,
        Command::Paste,
        Command::Bold,
        Command::Italic,
        Command::Underline,
    ];

    /// Stable id used in keybinding files.
    pub fn id(&self) -> &'static str {
        match self {
            Command::Undo => "edit.undo",
            Command::Redo => "edit.redo",
            Command::Copy => "edit.copy",
            Command::Cut => "edit.cut",
            Command::Paste => "edit.paste",
            Command::Bold => "format.bold",
            Command::Italic => "format.italic",
            Command::Underline => "format.underline",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Built-in chord table. Cmd and Ctrl are matched alike.
pub const DEFAULT_BINDINGS: &[(&str, Command)] = &[
    ("ctrl+z", Command::Undo),
    ("ctrl+shift+z", Command::Redo),
    ("ctrl+y", Command::Redo),
    ("ctrl+c", Command::Copy),
    ("ctrl+x", Command::Cut),
    ("ctrl+v", Command::Paste),
    ("ctrl+b", Command::Bold),
    ("ctrl+i", Command::Italic),
    ("ctrl+u", Command::Underline),
];

/// A normalised key chord.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub key: String,
}

impl KeyChord {
    /// Parse `"Ctrl+Shift+Z"`, `"cmd+z"` and similar. `cmd`, `meta` and `super`
    /// fold into `ctrl`. Returns `None` without a main key.
    pub fn parse(chord: &str) -> Option<Self> {
        let mut parsed = KeyChord {
            ctrl: false,
            shift: false,
            alt: false,
            key: String::new(),
        };
        for part in chord.to_lowercase().split('+') {
            match part.trim() {
                "ctrl" | "control" | "cmd" | "command" | "meta" | "super" => parsed.ctrl = true,
                "shift" => parsed.shift = true,
                "alt" | "option" => parsed.alt = true,
                "" => {}
                key => parsed.key = key.to_string(),
            }
        }
        if parsed.key.is_empty() {
            None
        } else {
            Some(parsed)
        }
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        if self.alt {
            f.write_str("alt+")?;
        }
        f.write_str(&self.key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShortcutDispatcher {
    bindings: FxHashMap<KeyChord, Command>,
    attached: bool,
}

impl ShortcutDispatcher {
    /// Empty and detached.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::new();
        for (chord, command) in DEFAULT_BINDINGS {
            dispatcher.bind(chord, *command);
        }
        dispatcher
    }

    /// Build from `(chord, command id)` pairs such as a keybinding file yields.
    /// Unknown commands and unparseable chords are skipped.
    pub fn from_pairs<I, K, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, C)>,
        K: AsRef<str>,
        C: AsRef<str>,
    {
        let mut dispatcher = Self::new();
        for (chord, id) in pairs {
            match Command::from_id(id.as_ref()) {
                Some(command) => {
                    if !dispatcher.bind(chord.as_ref(), command) {
                        log::warn!("ignoring unparseable chord {:?}", chord.as_ref());
                    }
                }
                None => log::warn!("ignoring unknown command {:?}", id.as_ref()),
            }
        }
        dispatcher
    }

    /// Returns `false` if the chord does not parse.
    pub fn bind(&mut self, chord: &str, command: Command) -> bool {
        match KeyChord::parse(chord) {
            Some(parsed) => {
                self.bindings.insert(parsed, command);
                true
            }
            None => false,
        }
    }

    pub fn attach(&mut self) {
        self.attached = true;
        log::debug!("shortcuts attached ({} bindings)", self.bindings.len());
    }

    pub fn detach(&mut self) {
        self.attached = false;
        log::debug!("shortcuts detached");
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn command_for(&self, chord: &str) -> Option<Command> {
        KeyChord::parse(chord).and_then(|c| self.bindings.get(&c).copied())
    }

    /// Route a chord to the document. Returns whether it was handled.
    ///
    /// A handled chord whose command is rejected still counts as handled;
    /// the rejection lands in the document's status message.
    pub fn dispatch(&self, chord: &str, doc: &mut SheetDocument) -> bool {
        if !self.attached {
            return false;
        }
        let Some(command) = self.command_for(chord) else {
            return false;
        };
        log::debug!("shortcut {} -> {}", chord, command);
        let _ = doc.execute(command);
        true
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_normalisation() {
        let a = KeyChord::parse("Shift+Ctrl+Z").unwrap();
        let b = KeyChord::parse("cmd+shift+z").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "ctrl+shift+z");
        assert_eq!(KeyChord::parse("meta + b").unwrap().to_string(), "ctrl+b");
        assert!(KeyChord::parse("ctrl+").is_none());
    }

    #[test]
    fn test_command_ids() {
        for command in Command::ALL {
            assert_eq!(Command::from_id(command.id()), Some(command));
        }
        assert_eq!(Command::from_id("edit.nope"), None);
    }

    #[test]
    fn test_default_table() {
        let d = ShortcutDispatcher::with_defaults();
        assert_eq!(d.len(), 9);
        assert_eq!(d.command_for("Ctrl+Y"), Some(Command::Redo));
        assert_eq!(d.command_for("cmd+shift+z"), Some(Command::Redo));
        assert_eq!(d.command_for("ctrl+z"), Some(Command::Undo));
        assert_eq!(d.command_for("ctrl+q"), None);
        assert!(!d.is_attached());
    }

    #[test]
    fn test_from_pairs_skips_unknown() {
        let d = ShortcutDispatcher::from_pairs([
            ("alt+b", "format.bold"),
            ("ctrl+k", "edit.frobnicate"),
            ("", "edit.undo"),
        ]);
        assert_eq!(d.len(), 1);
        assert_eq!(d.command_for("alt+b"), Some(Command::Bold));
    }
}
