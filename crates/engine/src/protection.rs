//! Locked cells.

use rustc_hash::FxHashSet;

use crate::cell_id::CellKey;

#[derive(Debug, Clone, Default)]
pub struct ProtectedCells {
    locked: FxHashSet<CellKey>,
}

impl ProtectedCells {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip protection. Returns the new state (true = now protected).
    pub fn toggle(&mut self, key: CellKey) -> bool {
        if self.locked.remove(&key) {
            false
        } else {
            self.locked.insert(key);
            true
        }
    }

    pub fn is_protected(&self, key: &CellKey) -> bool {
        self.locked.contains(key)
    }

    pub fn len(&self) -> usize {
        self.locked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked.is_empty()
    }
}
