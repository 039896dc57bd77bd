//! Active cell and row selection.

use std::collections::HashSet;

use crate::cell_id::{CellRef, RowId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    active: Option<CellRef>,
    rows: HashSet<RowId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&CellRef> {
        self.active.as_ref()
    }

    pub fn set_active(&mut self, cell: Option<CellRef>) {
        self.active = cell;
    }

    pub fn rows(&self) -> &HashSet<RowId> {
        &self.rows
    }

    /// Flip a row in or out of the selection. Returns whether it is now selected.
    pub fn toggle_row(&mut self, id: RowId) -> bool {
        if self.rows.remove(&id) {
            false
        } else {
            self.rows.insert(id);
            true
        }
    }

    /// Drop row ids that no longer exist.
    pub fn retain_rows(&mut self, keep: impl Fn(&RowId) -> bool) {
        self.rows.retain(|id| keep(id));
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.rows.clear();
    }
}
