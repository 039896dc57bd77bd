//! Change notifications for the hosting view.
//!
//! The document invokes the save callback after every mutating operation
//! and the lock hooks when the user claims a row, column or cell. Neither
//! is awaited; persistence and presence transport live in the host.

use crate::cell_id::{CellKey, RowId};
use crate::sheet::Snapshot;

/// What a successful mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    RowInserted,
    RowsDeleted,
    ColumnInserted,
    ColumnDeleted,
    ColumnTypeChanged,
    ColumnRenamed,
    ColumnsReordered,
    ColumnResized,
    CellEdited,
    CellTypeChanged,
    FormatChanged,
    Cut,
    Pasted,
    ProtectionToggled,
    WrapToggled,
    Undo,
    Redo,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RowInserted => "row_inserted",
            Self::RowsDeleted => "rows_deleted",
            Self::ColumnInserted => "column_inserted",
            Self::ColumnDeleted => "column_deleted",
            Self::ColumnTypeChanged => "column_type_changed",
            Self::ColumnRenamed => "column_renamed",
            Self::ColumnsReordered => "columns_reordered",
            Self::ColumnResized => "column_resized",
            Self::CellEdited => "cell_edited",
            Self::CellTypeChanged => "cell_type_changed",
            Self::FormatChanged => "format_changed",
            Self::Cut => "cut",
            Self::Pasted => "pasted",
            Self::ProtectionToggled => "protection_toggled",
            Self::WrapToggled => "wrap_toggled",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

/// Passed to the save callback. `snapshot` is the current state after the change.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveEvent {
    pub kind: ChangeKind,
    pub snapshot: Snapshot,
}

/// Presence claim raised by the local user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockEvent {
    Row(RowId),
    Column(String),
    Cell(CellKey),
}

/// Callback type for save notifications.
pub type SaveCallback = Box<dyn FnMut(SaveEvent) + Send>;

/// Callback type for lock notifications.
pub type LockCallback<T> = Box<dyn FnMut(T) + Send>;

/// Host hooks for collaboration presence. Unset hooks are skipped.
#[derive(Default)]
pub struct CollabHooks {
    pub on_lock_row: Option<LockCallback<RowId>>,
    pub on_lock_column: Option<LockCallback<String>>,
    pub on_lock_cell: Option<LockCallback<CellKey>>,
}

impl CollabHooks {
    /// Route a lock claim to the matching hook. Returns `false` if none is set.
    pub fn dispatch(&mut self, event: LockEvent) -> bool {
        match event {
            LockEvent::Row(id) => self.on_lock_row.as_mut().map(|cb| cb(id)).is_some(),
            LockEvent::Column(key) => self.on_lock_column.as_mut().map(|cb| cb(key)).is_some(),
            LockEvent::Cell(key) => self.on_lock_cell.as_mut().map(|cb| cb(key)).is_some(),
        }
    }
}

impl std::fmt::Debug for CollabHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollabHooks")
            .field("on_lock_row", &self.on_lock_row.is_some())
            .field("on_lock_column", &self.on_lock_column.is_some())
            .field("on_lock_cell", &self.on_lock_cell.is_some())
            .finish()
    }
}

/// Simple event collector for testing.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<SaveEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: SaveEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SaveEvent] {
        &self.events
    }

    pub fn kinds(&self) -> Vec<ChangeKind> {
        self.events.iter().map(|e| e.kind).collect()
    }

    pub fn last(&self) -> Option<&SaveEvent> {
        self.events.last()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
