//! Sparse per-cell format overrides.

use rustc_hash::FxHashMap;

use crate::cell::{CellFormat, FormatPatch, DEFAULT_FONT_SIZE};
use crate::cell_id::CellKey;

#[derive(Debug, Clone)]
pub struct FormatStore {
    patches: FxHashMap<CellKey, FormatPatch>,
    base_font_size: f32,
}

impl Default for FormatStore {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_SIZE)
    }
}

impl FormatStore {
    pub fn new(base_font_size: f32) -> Self {
        Self {
            patches: FxHashMap::default(),
            base_font_size,
        }
    }

    /// Stored override for a cell, if any.
    pub fn patch(&self, key: &CellKey) -> Option<&FormatPatch> {
        self.patches.get(key)
    }

    /// Resolved format (defaults filled in).
    pub fn format(&self, key: &CellKey) -> CellFormat {
        match self.patches.get(key) {
            Some(patch) => patch.resolve(self.base_font_size),
            None => FormatPatch::default().resolve(self.base_font_size),
        }
    }

    /// Shallow-merge `patch` into the cell's stored override.
    pub fn apply(&mut self, key: CellKey, patch: &FormatPatch) {
        let merged = match self.patches.get(&key) {
            Some(existing) => existing.merged(patch),
            None => patch.clone(),
        };
        self.patches.insert(key, merged);
    }

    pub fn clear(&mut self, key: &CellKey) -> bool {
        self.patches.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}
