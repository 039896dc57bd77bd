//! Per-cell type overrides on top of a column's declared type.

use rustc_hash::FxHashMap;

use crate::cell::CellType;
use crate::cell_id::CellKey;

#[derive(Debug, Clone, Default)]
pub struct TypeOverrides {
    overrides: FxHashMap<CellKey, CellType>,
}

impl TypeOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective type: the override if present, else the column default.
    pub fn cell_type(&self, key: &CellKey, column_default: CellType) -> CellType {
        self.overrides.get(key).copied().unwrap_or(column_default)
    }

    pub fn set(&mut self, key: CellKey, kind: CellType) {
        self.overrides.insert(key, kind);
    }

    /// Drop every override under a column (used when the column is retyped).
    pub fn clear_column(&mut self, col: &str) {
        self.overrides.retain(|k, _| k.col != col);
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
