//! Single-cell internal clipboard.

use crate::cell::CellValue;
use crate::cell_id::CellRef;

/// Copied cell payload and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    /// `None` when the source cell was undefined
    pub data: Option<CellValue>,
    pub source: CellRef,
}

/// One slot. Paste reads without clearing, so it can repeat.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    entry: Option<ClipboardEntry>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, data: Option<CellValue>, source: CellRef) {
        self.entry = Some(ClipboardEntry { data, source });
    }

    pub fn entry(&self) -> Option<&ClipboardEntry> {
        self.entry.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}
