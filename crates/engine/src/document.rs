//! The editable sheet: one owner for rows, columns, history and the
//! per-cell side tables.
//!
//! Every mutation builds a new `Snapshot` and pushes it; nothing reaches
//! into a snapshot that history already holds. Rejected operations leave
//! state untouched, push nothing, and leave their notice in
//! `status_message`.
//!
//! Format, type override, protection and wrap state live beside the
//! history, not inside it: undo restores values, not styling.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::cell::{CellFormat, CellStyle, CellType, CellValue, FormatPatch, DEFAULT_FONT_SIZE};
use crate::cell_id::{CellKey, CellRef, IdGen, RowId};
use crate::cell_types::TypeOverrides;
use crate::clipboard::Clipboard;
use crate::error::SheetError;
use crate::events::{ChangeKind, CollabHooks, LockEvent, SaveCallback, SaveEvent};
use crate::format::FormatStore;
use crate::formula::{self, refs, FormulaResult};
use crate::history::History;
use crate::layout::{fit_column_width, row_height, LayoutConfig, WrapColumns};
use crate::protection::ProtectedCells;
use crate::selection::Selection;
use crate::sheet::{
    append_column, append_row, column_by_name, find_column, map_column, remove_column, remove_rows,
    reorder_columns, retype_column, ColumnDef, Row, Snapshot,
};
use crate::shortcuts::Command;
use crate::template::{Seed, SeedOptions, Template};

/// Engine-side settings. Hosts build this from their own config.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetConfig {
    pub layout: LayoutConfig,
    pub seed: SeedOptions,
    /// Default cell font size in px
    pub font_size: f32,
    /// Max retained history entries, 0 = unbounded
    pub history_limit: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            seed: SeedOptions::default(),
            font_size: DEFAULT_FONT_SIZE,
            history_limit: 100,
        }
    }
}

/// Source of time for ids and date defaults.
pub trait Clock: Send {
    fn now_millis(&self) -> i64;
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock that never moves. Ids stay unique through `IdGen`.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub millis: i64,
    pub today: NaiveDate,
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.millis
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

/// A cell resolved against the committed snapshot.
struct Located {
    row: usize,
    key: CellKey,
    kind: CellType,
    editable: bool,
}

/// In-flight column gesture. Widths and order change on a working copy
/// and are committed once when the gesture ends.
enum Gesture {
    Drag { key: String, columns: Vec<ColumnDef> },
    Resize { key: String, columns: Vec<ColumnDef> },
}

pub struct SheetDocument {
    title: String,
    history: History<Snapshot>,
    gesture: Option<Gesture>,
    formats: FormatStore,
    cell_types: TypeOverrides,
    protected: ProtectedCells,
    wrap: WrapColumns,
    clipboard: Clipboard,
    selection: Selection,
    ids: IdGen,
    config: SheetConfig,
    clock: Box<dyn Clock>,
    status_message: Option<String>,
    on_save: Option<SaveCallback>,
    hooks: CollabHooks,
}

impl SheetDocument {
    pub fn new(seed: Seed, config: SheetConfig) -> Self {
        Self::with_clock(seed, config, Box::new(SystemClock))
    }

    pub fn with_clock(seed: Seed, config: SheetConfig, clock: Box<dyn Clock>) -> Self {
        let snapshot = Snapshot::new(seed.rows, seed.columns);
        Self {
            title: seed.title,
            history: History::with_limit(snapshot, config.history_limit),
            gesture: None,
            formats: FormatStore::new(config.font_size),
            cell_types: TypeOverrides::new(),
            protected: ProtectedCells::new(),
            wrap: WrapColumns::new(),
            clipboard: Clipboard::new(),
            selection: Selection::new(),
            ids: IdGen::new(),
            config,
            clock,
            status_message: None,
            on_save: None,
            hooks: CollabHooks::default(),
        }
    }

    /// Open a named template (`budget`, `timeline`, `inventory`, `blank`).
    pub fn from_template(name: &str, config: SheetConfig) -> Result<Self, SheetError> {
        let template = Template::from_name(name)?;
        let seed = template.seed(&config.seed, SystemClock.today());
        log::info!("opened template {}", template);
        Ok(Self::new(seed, config))
    }

    // ---- Accessors ----

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.history.current()
    }

    pub fn rows(&self) -> &[Row] {
        self.history.current().rows.as_slice()
    }

    /// Columns as the grid should draw them, including an uncommitted drag or resize.
    pub fn columns(&self) -> &[ColumnDef] {
        match &self.gesture {
            Some(Gesture::Drag { columns, .. }) | Some(Gesture::Resize { columns, .. }) => columns.as_slice(),
            None => self.history.current().columns.as_slice(),
        }
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn take_status_message(&mut self) -> Option<String> {
        self.status_message.take()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.depth()
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn wrap_columns(&self) -> &WrapColumns {
        &self.wrap
    }

    pub fn set_on_save(&mut self, callback: SaveCallback) {
        self.on_save = Some(callback);
    }

    pub fn hooks_mut(&mut self) -> &mut CollabHooks {
        &mut self.hooks
    }

    /// Serialise the current snapshot for persistence.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self.snapshot())
    }

    /// Resolve a formula-style address (`B3`) to a grid position.
    pub fn cell_ref(&self, address: &str) -> Option<CellRef> {
        let addr = refs::parse_address(address)?;
        let column = column_by_name(&self.snapshot().columns, &addr.column)?;
        Some(CellRef::new(addr.row, column.key.clone()))
    }

    // ---- Selection ----

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select_cell(&mut self, cell: CellRef) {
        self.selection.set_active(Some(cell));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Toggle a row (by index) in the row selection.
    pub fn toggle_row_selection(&mut self, row: usize) -> Result<bool, SheetError> {
        self.guarded(|doc| {
            let id = doc.row_id(row)?;
            Ok(doc.selection.toggle_row(id))
        })
    }

    // ---- Rows and columns ----

    /// Append a row of type defaults. Returns its id.
    pub fn insert_row(&mut self) -> RowId {
        let now = self.clock.now_millis();
        let today = self.clock.today();
        let id = loop {
            let id = self.ids.row_id(now);
            if !self.rows().iter().any(|r| r.id == id) {
                break id;
            }
        };
        let row = Row::with_defaults(id.clone(), &self.snapshot().columns, today);
        let next = self.snapshot().with_rows(append_row(self.rows(), row));
        self.commit(next, ChangeKind::RowInserted);
        id
    }

    /// Remove the given rows. Returns how many were removed.
    pub fn delete_rows(&mut self, selected: &HashSet<RowId>) -> Result<usize, SheetError> {
        self.guarded(|doc| {
            if selected.is_empty() {
                return Err(SheetError::EmptyRowSelection);
            }
            let next_rows = remove_rows(doc.rows(), selected);
            let removed = doc.rows().len() - next_rows.len();
            if removed == 0 {
                return Ok(0);
            }
            let next = doc.snapshot().with_rows(next_rows);
            doc.commit(next, ChangeKind::RowsDeleted);
            doc.selection.retain_rows(|id| !selected.contains(id));
            Ok(removed)
        })
    }

    pub fn delete_selected_rows(&mut self) -> Result<usize, SheetError> {
        let selected = self.selection.rows().clone();
        self.delete_rows(&selected)
    }

    /// Append a column of `kind`; every row gains the type default. One history step.
    pub fn insert_column(&mut self, kind: CellType) -> String {
        let now = self.clock.now_millis();
        let today = self.clock.today();
        let key = loop {
            let key = self.ids.column_key(now);
            if find_column(&self.snapshot().columns, &key).is_none() {
                break key;
            }
        };
        let snap = self.snapshot();
        let name = format!("Column {}", snap.columns.len() + 1);
        let column = ColumnDef::new(key.clone(), name, kind, self.config.layout.default_column_width);
        let (columns, rows) = append_column(&snap.columns, &snap.rows, column, today);
        self.commit(Snapshot::new(rows, columns), ChangeKind::ColumnInserted);
        key
    }

    /// Remove a column definition. The last column cannot go.
    pub fn delete_column(&mut self, key: &str) -> Result<(), SheetError> {
        self.guarded(|doc| {
            let columns = remove_column(&doc.snapshot().columns, key)?;
            let next = doc.snapshot().with_columns(columns);
            doc.commit(next, ChangeKind::ColumnDeleted);
            if doc.selection.active().is_some_and(|c| c.col == key) {
                doc.selection.set_active(None);
            }
            Ok(())
        })
    }

    /// Retype a column and reset its values to the new type's default.
    pub fn change_column_type(&mut self, key: &str, kind: CellType) -> Result<(), SheetError> {
        self.guarded(|doc| {
            let today = doc.clock.today();
            let snap = doc.snapshot();
            let (columns, rows) = retype_column(&snap.columns, &snap.rows, key, kind, today)?;
            doc.cell_types.clear_column(key);
            doc.commit(Snapshot::new(rows, columns), ChangeKind::ColumnTypeChanged);
            Ok(())
        })
    }

    pub fn rename_column(&mut self, key: &str, name: &str) -> Result<(), SheetError> {
        self.guarded(|doc| {
            let columns = map_column(&doc.snapshot().columns, key, |c| ColumnDef {
                name: name.to_string(),
                ..c.clone()
            })?;
            let next = doc.snapshot().with_columns(columns);
            doc.commit(next, ChangeKind::ColumnRenamed);
            Ok(())
        })
    }

    // ---- Column gestures ----

    pub fn begin_column_drag(&mut self, key: &str) -> Result<(), SheetError> {
        self.guarded(|doc| {
            let columns = doc.snapshot().columns.to_vec();
            if find_column(&columns, key).is_none() {
                return Err(SheetError::UnknownColumn(key.to_string()));
            }
            doc.gesture = Some(Gesture::Drag { key: key.to_string(), columns });
            Ok(())
        })
    }

    /// Live reorder while dragging. No history push.
    pub fn drag_column_over(&mut self, target: &str) -> bool {
        let Some(Gesture::Drag { key, columns }) = &mut self.gesture else {
            return false;
        };
        match reorder_columns(columns, key, target) {
            Some(next) => {
                *columns = next;
                true
            }
            None => false,
        }
    }

    /// Commit the dragged order as one history step. Returns whether anything moved.
    pub fn end_column_drag(&mut self) -> bool {
        match self.gesture.take() {
            Some(Gesture::Drag { columns, .. }) => self.commit_gesture(columns, ChangeKind::ColumnsReordered),
            other => {
                self.gesture = other;
                false
            }
        }
    }

    pub fn begin_column_resize(&mut self, key: &str) -> Result<(), SheetError> {
        self.guarded(|doc| {
            let columns = doc.snapshot().columns.to_vec();
            let column = find_column(&columns, key).ok_or_else(|| SheetError::UnknownColumn(key.to_string()))?;
            if !column.resizable {
                return Err(SheetError::NotResizable(key.to_string()));
            }
            doc.gesture = Some(Gesture::Resize { key: key.to_string(), columns });
            Ok(())
        })
    }

    /// Live width change, clamped to the layout bounds. No history push.
    pub fn update_column_resize(&mut self, width: f32) -> bool {
        let layout = self.config.layout;
        let Some(Gesture::Resize { key, columns }) = &mut self.gesture else {
            return false;
        };
        match columns.iter_mut().find(|c| c.key == *key) {
            Some(column) => {
                column.width = width.clamp(layout.min_column_width, layout.max_column_width);
                true
            }
            None => false,
        }
    }

    /// Commit the final width as one history step.
    pub fn end_column_resize(&mut self) -> bool {
        match self.gesture.take() {
            Some(Gesture::Resize { columns, .. }) => self.commit_gesture(columns, ChangeKind::ColumnResized),
            other => {
                self.gesture = other;
                false
            }
        }
    }

    /// Begin, set and end a resize in one call.
    pub fn resize_column(&mut self, key: &str, width: f32) -> Result<bool, SheetError> {
        self.begin_column_resize(key)?;
        self.update_column_resize(width);
        Ok(self.end_column_resize())
    }

    /// Fit a column to its header and rendered contents. One history step
    /// when the width changes.
    pub fn auto_size_column(&mut self, key: &str) -> Result<f32, SheetError> {
        self.guarded(|doc| {
            let column = find_column(&doc.snapshot().columns, key)
                .cloned()
                .ok_or_else(|| SheetError::UnknownColumn(key.to_string()))?;
            let texts: Vec<String> = (0..doc.rows().len()).map(|row| doc.display_at(row, key)).collect();
            let width = fit_column_width(&column, &texts, &doc.config.layout);
            if width != column.width {
                let columns = map_column(&doc.snapshot().columns, key, |c| ColumnDef { width, ..c.clone() })?;
                let next = doc.snapshot().with_columns(columns);
                doc.commit(next, ChangeKind::ColumnResized);
            }
            Ok(width)
        })
    }

    // ---- Cells ----

    /// Effective type of a cell: its override, else the column's type.
    pub fn cell_type(&self, cell: &CellRef) -> Option<CellType> {
        self.locate(cell).ok().map(|loc| loc.kind)
    }

    /// Override one cell's type and reset its value to that type's default.
    pub fn change_cell_type(&mut self, cell: &CellRef, kind: CellType) -> Result<(), SheetError> {
        self.guarded(|doc| {
            let loc = doc.locate(cell)?;
            doc.ensure_writable(&loc)?;
            let value = kind.default_value(doc.clock.today());
            doc.cell_types.set(loc.key, kind);
            let rows = doc.rows_with_cell(loc.row, &cell.col, value);
            let next = doc.snapshot().with_rows(rows);
            doc.commit(next, ChangeKind::CellTypeChanged);
            Ok(())
        })
    }

    /// Store user input, coerced to the cell's effective type.
    /// Returns `false` when the stored value did not change.
    pub fn set_cell_value(&mut self, cell: &CellRef, input: &str) -> Result<bool, SheetError> {
        self.guarded(|doc| {
            let loc = doc.locate(cell)?;
            doc.ensure_writable(&loc)?;
            let value = loc.kind.coerce_input(input);
            if doc.rows()[loc.row].get(&cell.col) == Some(&value) {
                return Ok(false);
            }
            let rows = doc.rows_with_cell(loc.row, &cell.col, value);
            let next = doc.snapshot().with_rows(rows);
            doc.commit(next, ChangeKind::CellEdited);
            Ok(true)
        })
    }

    pub fn cell_value(&self, cell: &CellRef) -> Option<&CellValue> {
        self.rows().get(cell.row).and_then(|r| r.get(&cell.col))
    }

    /// Rendered text of a cell; formulas are evaluated. Undefined cells render empty.
    pub fn display_value(&self, cell: &CellRef) -> String {
        self.display_at(cell.row, &cell.col)
    }

    /// Evaluate arbitrary input against the current sheet.
    pub fn evaluate(&self, input: &str) -> FormulaResult {
        let snap = self.snapshot();
        formula::evaluate(input, &snap.rows, &snap.columns)
    }

    fn display_at(&self, row: usize, key: &str) -> String {
        let snap = self.snapshot();
        match snap.rows.get(row).and_then(|r| r.get(key)) {
            Some(CellValue::Text(s)) if s.starts_with('=') => {
                formula::evaluate(s, &snap.rows, &snap.columns).to_string()
            }
            Some(value) => value.to_string(),
            None => String::new(),
        }
    }

    // ---- Formatting ----

    /// Merge a partial format into the active cell's format.
    pub fn apply_format(&mut self, patch: &FormatPatch) -> Result<(), SheetError> {
        self.guarded(|doc| {
            let cell = doc.active_cell()?;
            doc.merge_format(&cell, patch)
        })
    }

    /// Merge a partial format into a given cell's format.
    pub fn format_cell(&mut self, cell: &CellRef, patch: &FormatPatch) -> Result<(), SheetError> {
        self.guarded(|doc| doc.merge_format(cell, patch))
    }

    pub fn toggle_bold(&mut self) -> Result<bool, SheetError> {
        self.toggle_flag(|f| f.bold, FormatPatch::bold)
    }

    pub fn toggle_italic(&mut self) -> Result<bool, SheetError> {
        self.toggle_flag(|f| f.italic, FormatPatch::italic)
    }

    pub fn toggle_underline(&mut self) -> Result<bool, SheetError> {
        self.toggle_flag(|f| f.underline, FormatPatch::underline)
    }

    pub fn toggle_strikethrough(&mut self) -> Result<bool, SheetError> {
        self.toggle_flag(|f| f.strikethrough, FormatPatch::strikethrough)
    }

    /// Drop the active cell's format override. Returns whether one existed.
    pub fn clear_format(&mut self) -> Result<bool, SheetError> {
        self.guarded(|doc| {
            let cell = doc.active_cell()?;
            let loc = doc.locate(&cell)?;
            let removed = doc.formats.clear(&loc.key);
            if removed {
                doc.emit(ChangeKind::FormatChanged);
            }
            Ok(removed)
        })
    }

    pub fn cell_format(&self, cell: &CellRef) -> CellFormat {
        match self.locate(cell) {
            Ok(loc) => self.formats.format(&loc.key),
            Err(_) => FormatPatch::default().resolve(self.config.font_size),
        }
    }

    /// Render style for a cell. Pure; safe to call per cell per frame.
    pub fn cell_style(&self, cell: &CellRef) -> CellStyle {
        CellStyle::from_format(&self.cell_format(cell), self.wrap.contains(&cell.col))
    }

    fn merge_format(&mut self, cell: &CellRef, patch: &FormatPatch) -> Result<(), SheetError> {
        let loc = self.locate(cell)?;
        self.formats.apply(loc.key, patch);
        self.emit(ChangeKind::FormatChanged);
        Ok(())
    }

    /// Read the active cell's flag, write its negation.
    fn toggle_flag(
        &mut self,
        read: fn(&CellFormat) -> bool,
        patch: fn(bool) -> FormatPatch,
    ) -> Result<bool, SheetError> {
        self.guarded(|doc| {
            let cell = doc.active_cell()?;
            let loc = doc.locate(&cell)?;
            let next = !read(&doc.formats.format(&loc.key));
            doc.formats.apply(loc.key, &patch(next));
            doc.emit(ChangeKind::FormatChanged);
            Ok(next)
        })
    }

    // ---- Clipboard ----

    pub fn copy(&mut self) -> Result<(), SheetError> {
        self.guarded(|doc| {
            let cell = doc.active_cell()?;
            let loc = doc.locate(&cell)?;
            let data = doc.rows()[loc.row].get(&cell.col).cloned();
            doc.clipboard.store(data, cell);
            Ok(())
        })
    }

    /// Copy, then empty the source cell.
    pub fn cut(&mut self) -> Result<(), SheetError> {
        self.guarded(|doc| {
            let cell = doc.active_cell()?;
            let loc = doc.locate(&cell)?;
            doc.ensure_writable(&loc)?;
            let data = doc.rows()[loc.row].get(&cell.col).cloned();
            let rows = doc.rows_with_cell(loc.row, &cell.col, CellValue::Text(String::new()));
            doc.clipboard.store(data, cell);
            let next = doc.snapshot().with_rows(rows);
            doc.commit(next, ChangeKind::Cut);
            Ok(())
        })
    }

    /// Write the clipboard into the active cell. The clipboard is kept.
    pub fn paste(&mut self) -> Result<(), SheetError> {
        self.guarded(|doc| {
            let cell = doc.active_cell()?;
            let entry = doc.clipboard.entry().cloned().ok_or(SheetError::NothingToPaste)?;
            let loc = doc.locate(&cell)?;
            doc.ensure_writable(&loc)?;
            let rows = doc.rows_with_cell(loc.row, &cell.col, entry.data.unwrap_or_default());
            let next = doc.snapshot().with_rows(rows);
            doc.commit(next, ChangeKind::Pasted);
            Ok(())
        })
    }

    // ---- Wrap and sizing ----

    /// Flip text wrap for a column. Returns the new state.
    pub fn toggle_text_wrap(&mut self, key: &str) -> Result<bool, SheetError> {
        self.guarded(|doc| {
            if find_column(&doc.snapshot().columns, key).is_none() {
                return Err(SheetError::UnknownColumn(key.to_string()));
            }
            let wrapped = doc.wrap.toggle(key);
            doc.emit(ChangeKind::WrapToggled);
            Ok(wrapped)
        })
    }

    /// Pixel height of a row. Recomputed from current content on every call.
    pub fn row_height(&self, row: usize) -> f32 {
        match self.rows().get(row) {
            Some(r) => row_height(r, self.columns(), &self.wrap, &self.config.layout),
            None => self.config.layout.min_row_height,
        }
    }

    // ---- Protection ----

    /// Lock or unlock the active cell. Returns whether it is now protected.
    pub fn toggle_protect_cell(&mut self) -> Result<bool, SheetError> {
        self.guarded(|doc| {
            let cell = doc.active_cell()?;
            let loc = doc.locate(&cell)?;
            let locked = doc.protected.toggle(loc.key);
            doc.emit(ChangeKind::ProtectionToggled);
            Ok(locked)
        })
    }

    pub fn is_cell_protected(&self, cell: &CellRef) -> bool {
        self.locate(cell)
            .map(|loc| self.protected.is_protected(&loc.key))
            .unwrap_or(false)
    }

    // ---- Collaboration hooks ----

    /// Returns whether a host hook received the claim.
    pub fn lock_row(&mut self, row: usize) -> Result<bool, SheetError> {
        self.guarded(|doc| {
            let id = doc.row_id(row)?;
            Ok(doc.hooks.dispatch(LockEvent::Row(id)))
        })
    }

    pub fn lock_column(&mut self, key: &str) -> Result<bool, SheetError> {
        self.guarded(|doc| {
            if find_column(&doc.snapshot().columns, key).is_none() {
                return Err(SheetError::UnknownColumn(key.to_string()));
            }
            Ok(doc.hooks.dispatch(LockEvent::Column(key.to_string())))
        })
    }

    pub fn lock_cell(&mut self, cell: &CellRef) -> Result<bool, SheetError> {
        self.guarded(|doc| {
            let loc = doc.locate(cell)?;
            Ok(doc.hooks.dispatch(LockEvent::Cell(loc.key)))
        })
    }

    // ---- History ----

    pub fn undo(&mut self) -> bool {
        self.gesture = None;
        if self.history.undo().is_none() {
            return false;
        }
        self.emit(ChangeKind::Undo);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.gesture = None;
        if self.history.redo().is_none() {
            return false;
        }
        self.emit(ChangeKind::Redo);
        true
    }

    /// Replace the whole document with a new seed and a fresh history.
    pub fn reset(&mut self, seed: Seed) {
        log::info!("reset to '{}' ({} rows, {} columns)", seed.title, seed.rows.len(), seed.columns.len());
        self.title = seed.title;
        self.history.reset(Snapshot::new(seed.rows, seed.columns));
        self.gesture = None;
        self.formats = FormatStore::new(self.config.font_size);
        self.cell_types = TypeOverrides::new();
        self.protected = ProtectedCells::new();
        self.wrap = WrapColumns::new();
        self.selection.clear();
    }

    pub fn load_template(&mut self, name: &str) -> Result<(), SheetError> {
        self.guarded(|doc| {
            let template = Template::from_name(name)?;
            let seed = template.seed(&doc.config.seed, doc.clock.today());
            doc.reset(seed);
            Ok(())
        })
    }

    /// Run a keyboard command.
    pub fn execute(&mut self, command: Command) -> Result<(), SheetError> {
        match command {
            Command::Undo => {
                self.undo();
                Ok(())
            }
            Command::Redo => {
                self.redo();
                Ok(())
            }
            Command::Copy => self.copy(),
            Command::Cut => self.cut(),
            Command::Paste => self.paste(),
            Command::Bold => self.toggle_bold().map(|_| ()),
            Command::Italic => self.toggle_italic().map(|_| ()),
            Command::Underline => self.toggle_underline().map(|_| ()),
        }
    }

    // ---- Internals ----

    /// Run an operation; on rejection record the notice and log it.
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T, SheetError>) -> Result<T, SheetError> {
        let result = op(self);
        if let Err(err) = &result {
            log::warn!("rejected: {}", err);
            self.status_message = Some(err.to_string());
        }
        result
    }

    fn commit(&mut self, next: Snapshot, kind: ChangeKind) {
        self.gesture = None;
        self.history.push(next);
        log::debug!("{} ({} rows, {} columns)", kind.as_str(), self.rows().len(), self.snapshot().columns.len());
        self.emit(kind);
    }

    fn commit_gesture(&mut self, columns: Vec<ColumnDef>, kind: ChangeKind) -> bool {
        if columns.as_slice() == self.snapshot().columns.as_slice() {
            return false;
        }
        let next = self.snapshot().with_columns(columns);
        self.commit(next, kind);
        true
    }

    fn emit(&mut self, kind: ChangeKind) {
        if let Some(callback) = self.on_save.as_mut() {
            callback(SaveEvent {
                kind,
                snapshot: self.history.current().clone(),
            });
        }
    }

    fn active_cell(&self) -> Result<CellRef, SheetError> {
        self.selection.active().cloned().ok_or(SheetError::NoCellSelected)
    }

    fn row_id(&self, row: usize) -> Result<RowId, SheetError> {
        self.rows()
            .get(row)
            .map(|r| r.id.clone())
            .ok_or(SheetError::RowOutOfRange { row, len: self.rows().len() })
    }

    fn locate(&self, cell: &CellRef) -> Result<Located, SheetError> {
        let snap = self.snapshot();
        let row = snap.rows.get(cell.row).ok_or(SheetError::RowOutOfRange {
            row: cell.row,
            len: snap.rows.len(),
        })?;
        let column =
            find_column(&snap.columns, &cell.col).ok_or_else(|| SheetError::UnknownColumn(cell.col.clone()))?;
        let key = CellKey::new(row.id.clone(), cell.col.clone());
        let kind = self.cell_types.cell_type(&key, column.kind);
        Ok(Located {
            row: cell.row,
            key,
            kind,
            editable: column.editable,
        })
    }

    /// Protection first, then the column's editable flag.
    fn ensure_writable(&self, loc: &Located) -> Result<(), SheetError> {
        if self.protected.is_protected(&loc.key) {
            return Err(SheetError::CellProtected {
                row: loc.row,
                col: loc.key.col.clone(),
            });
        }
        if !loc.editable {
            return Err(SheetError::ReadOnlyColumn(loc.key.col.clone()));
        }
        Ok(())
    }

    /// New row vector with one cell replaced; other rows are shared clones.
    fn rows_with_cell(&self, row: usize, key: &str, value: CellValue) -> Vec<Row> {
        let mut rows = self.rows().to_vec();
        rows[row] = rows[row].with_value(key, value);
        rows
    }
}
