//! Edit scripts: one command per line, `#` starts a comment.
//!
//! Cells are addressed the way formulas address them: column display name
//! plus 1-based row number (`B3`). Columns are named by display name.

use std::collections::HashSet;
use std::fmt;
use std::io::Write;

use sheetcraft_config::KeybindingManager;
use sheetcraft_engine::cell::{Alignment, CellType, FormatPatch};
use sheetcraft_engine::cell_id::CellRef;
use sheetcraft_engine::sheet::column_by_name;
use sheetcraft_engine::shortcuts::ShortcutDispatcher;
use sheetcraft_engine::SheetDocument;

use crate::render;

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    Select(String),
    Set { cell: String, text: String },
    Key(String),
    InsertRow,
    /// 1-based row numbers
    DeleteRows(Vec<usize>),
    InsertColumn(CellType),
    DeleteColumn(String),
    CellType { cell: String, kind: CellType },
    ColumnType { column: String, kind: CellType },
    Rename { column: String, name: String },
    Move { column: String, target: String },
    Resize { column: String, width: f32 },
    AutoSize(String),
    Wrap(String),
    Protect,
    Format(FormatPatch),
    Eval(String),
    Undo,
    Redo,
    Copy,
    Cut,
    Paste,
    Template(String),
    Show,
}

/// Parse one script line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ScriptCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "select" => ScriptCommand::Select(one_arg(word, rest)?),
        "set" => {
            let (cell, text) = rest
                .split_once(char::is_whitespace)
                .map(|(c, t)| (c, t.trim_start()))
                .unwrap_or((rest, ""));
            if cell.is_empty() {
                return Err("usage: set <cell> <text>".to_string());
            }
            ScriptCommand::Set {
                cell: cell.to_string(),
                text: text.replace("\\n", "\n"),
            }
        }
        "key" => ScriptCommand::Key(one_arg(word, rest)?),
        "insert-row" => ScriptCommand::InsertRow,
        "delete-rows" => {
            let rows = rest
                .split(',')
                .map(|n| n.trim().parse::<usize>().map_err(|_| format!("bad row number '{}'", n.trim())))
                .collect::<Result<Vec<_>, _>>()?;
            ScriptCommand::DeleteRows(rows)
        }
        "insert-column" => ScriptCommand::InsertColumn(cell_type(if rest.is_empty() { "text" } else { rest })?),
        "delete-column" => ScriptCommand::DeleteColumn(one_arg(word, rest)?),
        "type" => {
            let (cell, kind) = two_args(word, rest)?;
            ScriptCommand::CellType { cell, kind: cell_type(&kind)? }
        }
        "column-type" => {
            let (column, kind) = two_args(word, rest)?;
            ScriptCommand::ColumnType { column, kind: cell_type(&kind)? }
        }
        "rename" => {
            let (column, name) = two_args(word, rest)?;
            ScriptCommand::Rename { column, name }
        }
        "move" => {
            let (column, target) = two_args(word, rest)?;
            ScriptCommand::Move { column, target }
        }
        "resize" => {
            let (column, width) = two_args(word, rest)?;
            let width = width.parse().map_err(|_| format!("bad width '{}'", width))?;
            ScriptCommand::Resize { column, width }
        }
        "autosize" => ScriptCommand::AutoSize(one_arg(word, rest)?),
        "wrap" => ScriptCommand::Wrap(one_arg(word, rest)?),
        "protect" => ScriptCommand::Protect,
        "format" => {
            let (field, value) = two_args(word, rest)?;
            ScriptCommand::Format(format_patch(&field, &value)?)
        }
        "eval" => ScriptCommand::Eval(rest.to_string()),
        "undo" => ScriptCommand::Undo,
        "redo" => ScriptCommand::Redo,
        "copy" => ScriptCommand::Copy,
        "cut" => ScriptCommand::Cut,
        "paste" => ScriptCommand::Paste,
        "template" => ScriptCommand::Template(one_arg(word, rest)?),
        "show" => ScriptCommand::Show,
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(Some(command))
}

fn one_arg(word: &str, rest: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("{} needs an argument", word))
    } else {
        Ok(rest.to_string())
    }
}

fn two_args(word: &str, rest: &str) -> Result<(String, String), String> {
    match rest.split_once(char::is_whitespace) {
        Some((a, b)) if !b.trim().is_empty() => Ok((a.to_string(), b.trim().to_string())),
        _ => Err(format!("{} needs two arguments", word)),
    }
}

fn cell_type(name: &str) -> Result<CellType, String> {
    CellType::from_name(name).ok_or_else(|| format!("unknown cell type '{}'", name))
}

fn flag(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(format!("expected on/off, got '{}'", value)),
    }
}

fn format_patch(field: &str, value: &str) -> Result<FormatPatch, String> {
    let patch = match field.to_ascii_lowercase().as_str() {
        "bold" => FormatPatch::bold(flag(value)?),
        "italic" => FormatPatch::italic(flag(value)?),
        "underline" => FormatPatch::underline(flag(value)?),
        "strikethrough" => FormatPatch::strikethrough(flag(value)?),
        "font-size" => FormatPatch {
            font_size: Some(value.parse().map_err(|_| format!("bad font size '{}'", value))?),
            ..FormatPatch::default()
        },
        "text-color" => FormatPatch {
            text_color: Some(value.to_string()),
            ..FormatPatch::default()
        },
        "bg-color" => FormatPatch {
            bg_color: Some(value.to_string()),
            ..FormatPatch::default()
        },
        "align" => FormatPatch {
            align: Some(Alignment::from_name(value).ok_or_else(|| format!("bad alignment '{}'", value))?),
            ..FormatPatch::default()
        },
        other => return Err(format!("unknown format field '{}'", other)),
    };
    Ok(patch)
}

/// Why a script stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptError {
    Parse { line: usize, message: String },
    Rejected { line: usize, message: String },
    Output(String),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { line, message } => write!(f, "line {}: {}", line, message),
            Self::Rejected { line, message } => write!(f, "line {}: rejected: {}", line, message),
            Self::Output(message) => write!(f, "writing output: {}", message),
        }
    }
}

impl std::error::Error for ScriptError {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub rejected: usize,
}

/// Replays scripts against a document it owns, with shortcuts attached.
pub struct Runner<W: Write> {
    doc: SheetDocument,
    keys: KeybindingManager,
    dispatcher: ShortcutDispatcher,
    out: W,
    strict: bool,
}

impl<W: Write> Runner<W> {
    pub fn new(doc: SheetDocument, keys: KeybindingManager, out: W, strict: bool) -> Self {
        let mut dispatcher = ShortcutDispatcher::from_pairs(keys.bindings());
        dispatcher.attach();
        Self {
            doc,
            keys,
            dispatcher,
            out,
            strict,
        }
    }

    pub fn doc(&self) -> &SheetDocument {
        &self.doc
    }

    /// Detach shortcuts and hand the document back.
    pub fn finish(mut self) -> (SheetDocument, W) {
        self.dispatcher.detach();
        (self.doc, self.out)
    }

    pub fn run_script(&mut self, script: &str) -> Result<RunSummary, ScriptError> {
        let mut summary = RunSummary::default();
        for (index, raw) in script.lines().enumerate() {
            let line = index + 1;
            let Some(command) = parse_line(raw).map_err(|message| ScriptError::Parse { line, message })? else {
                continue;
            };
            log::debug!("line {}: {:?}", line, command);

            let outcome = self.apply(&command);
            // Rejections inside the document also leave a notice behind
            let notice = self.doc.take_status_message();
            match outcome.and_then(|()| notice.map_or(Ok(()), Err)) {
                Ok(()) => summary.applied += 1,
                Err(message) => {
                    summary.rejected += 1;
                    writeln!(self.out, "line {}: {}", line, message).map_err(|e| ScriptError::Output(e.to_string()))?;
                    if self.strict {
                        return Err(ScriptError::Rejected { line, message });
                    }
                }
            }
        }
        Ok(summary)
    }

    fn apply(&mut self, command: &ScriptCommand) -> Result<(), String> {
        match command {
            ScriptCommand::Select(addr) => {
                let cell = self.cell(addr)?;
                self.doc.select_cell(cell);
            }
            ScriptCommand::Set { cell, text } => {
                let cell = self.cell(cell)?;
                self.doc.set_cell_value(&cell, text).map_err(|e| e.to_string())?;
            }
            ScriptCommand::Key(chord) => {
                let handled = self
                    .keys
                    .normalize_key(chord)
                    .is_some_and(|normalized| self.dispatcher.dispatch(&normalized, &mut self.doc));
                if !handled {
                    return Err(format!("no binding for '{}'", chord));
                }
            }
            ScriptCommand::InsertRow => {
                self.doc.insert_row();
            }
            ScriptCommand::DeleteRows(numbers) => {
                let ids = numbers
                    .iter()
                    .map(|n| {
                        n.checked_sub(1)
                            .and_then(|i| self.doc.rows().get(i))
                            .map(|r| r.id.clone())
                            .ok_or_else(|| format!("no row {}", n))
                    })
                    .collect::<Result<HashSet<_>, String>>()?;
                self.doc.delete_rows(&ids).map_err(|e| e.to_string())?;
            }
            ScriptCommand::InsertColumn(kind) => {
                self.doc.insert_column(*kind);
            }
            ScriptCommand::DeleteColumn(name) => {
                let key = self.column(name)?;
                self.doc.delete_column(&key).map_err(|e| e.to_string())?;
            }
            ScriptCommand::CellType { cell, kind } => {
                let cell = self.cell(cell)?;
                self.doc.change_cell_type(&cell, *kind).map_err(|e| e.to_string())?;
            }
            ScriptCommand::ColumnType { column, kind } => {
                let key = self.column(column)?;
                self.doc.change_column_type(&key, *kind).map_err(|e| e.to_string())?;
            }
            ScriptCommand::Rename { column, name } => {
                let key = self.column(column)?;
                self.doc.rename_column(&key, name).map_err(|e| e.to_string())?;
            }
            ScriptCommand::Move { column, target } => {
                let key = self.column(column)?;
                let target = self.column(target)?;
                self.doc.begin_column_drag(&key).map_err(|e| e.to_string())?;
                self.doc.drag_column_over(&target);
                self.doc.end_column_drag();
            }
            ScriptCommand::Resize { column, width } => {
                let key = self.column(column)?;
                self.doc.resize_column(&key, *width).map_err(|e| e.to_string())?;
            }
            ScriptCommand::AutoSize(column) => {
                let key = self.column(column)?;
                let width = self.doc.auto_size_column(&key).map_err(|e| e.to_string())?;
                self.print(&format!("{} width {}", column, width))?;
            }
            ScriptCommand::Wrap(column) => {
                let key = self.column(column)?;
                self.doc.toggle_text_wrap(&key).map_err(|e| e.to_string())?;
            }
            ScriptCommand::Protect => {
                self.doc.toggle_protect_cell().map_err(|e| e.to_string())?;
            }
            ScriptCommand::Format(patch) => {
                self.doc.apply_format(patch).map_err(|e| e.to_string())?;
            }
            ScriptCommand::Eval(formula) => {
                let result = self.doc.evaluate(formula).to_string();
                self.print(&result)?;
            }
            ScriptCommand::Undo => {
                self.doc.undo();
            }
            ScriptCommand::Redo => {
                self.doc.redo();
            }
            ScriptCommand::Copy => self.doc.copy().map_err(|e| e.to_string())?,
            ScriptCommand::Cut => self.doc.cut().map_err(|e| e.to_string())?,
            ScriptCommand::Paste => self.doc.paste().map_err(|e| e.to_string())?,
            ScriptCommand::Template(name) => {
                self.doc.load_template(name).map_err(|e| e.to_string())?;
            }
            ScriptCommand::Show => {
                render::render_grid(&self.doc, &mut self.out).map_err(|e| e.to_string())?;
            }
        }
        Ok(())
    }

    fn print(&mut self, text: &str) -> Result<(), String> {
        writeln!(self.out, "{}", text).map_err(|e| e.to_string())
    }

    fn cell(&self, addr: &str) -> Result<CellRef, String> {
        self.doc.cell_ref(addr).ok_or_else(|| format!("no cell at '{}'", addr))
    }

    fn column(&self, name: &str) -> Result<String, String> {
        column_by_name(&self.doc.snapshot().columns, name)
            .map(|c| c.key.clone())
            .ok_or_else(|| format!("no column named '{}'", name))
    }
}
