//! Cell identity.
//!
//! The grid addresses cells positionally (`CellRef`: row index + column
//! key). Per-cell side tables (formats, type overrides, protection) are
//! keyed by `CellKey` instead, which pins the row by its id so inserting or
//! deleting rows never moves an override onto a different record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a row record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Positional address of a cell as the grid sees it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    /// Row index (0-based)
    pub row: usize,
    /// Column key (not the display name)
    pub col: String,
}

impl CellRef {
    #[inline]
    pub fn new(row: usize, col: impl Into<String>) -> Self {
        Self { row, col: col.into() }
    }

    /// The legacy positional key string, `"{rowIndex}-{colKey}"`.
    pub fn positional_key(&self) -> String {
        format!("{}-{}", self.row, self.col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

/// Identity-based key for sparse per-cell maps.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub row: RowId,
    pub col: String,
}

impl CellKey {
    #[inline]
    pub fn new(row: RowId, col: impl Into<String>) -> Self {
        Self { row, col: col.into() }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

/// Convert 0-based column index to spreadsheet letter(s): 0=A, 25=Z, 26=AA.
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Monotonic millisecond stamps for time-based keys.
///
/// Two ids requested within the same millisecond still differ: the stamp is
/// bumped past the last one handed out.
#[derive(Debug, Default, Clone)]
pub struct IdGen {
    last: i64,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_stamp(&mut self, now_millis: i64) -> i64 {
        let stamp = now_millis.max(self.last + 1);
        self.last = stamp;
        stamp
    }

    pub fn row_id(&mut self, now_millis: i64) -> RowId {
        RowId(self.next_stamp(now_millis).to_string())
    }

    pub fn column_key(&mut self, now_millis: i64) -> String {
        format!("col_{}", self.next_stamp(now_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_to_letters() {
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(1), "B");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(col_to_letters(27), "AB");
        assert_eq!(col_to_letters(701), "ZZ");
        assert_eq!(col_to_letters(702), "AAA");
    }

    #[test]
    fn test_positional_key_format() {
        let cell = CellRef::new(3, "col_9");
        assert_eq!(cell.positional_key(), "3-col_9");
        assert_eq!(format!("{}", CellKey::new(RowId::new("r1"), "amount")), "r1-amount");
    }

    #[test]
    fn test_id_gen_never_repeats() {
        let mut ids = IdGen::new();
        let a = ids.column_key(1000);
        let b = ids.column_key(1000);
        let c = ids.column_key(999);
        assert_eq!(a, "col_1000");
        assert_eq!(b, "col_1001");
        assert_eq!(c, "col_1002");
        assert_eq!(ids.row_id(5000).as_str(), "5000");
    }
}
