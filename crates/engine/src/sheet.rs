//! Row and column model.
//!
//! Rows and columns are plain values. Every operation here takes the current
//! slice and returns a new `Vec`; the caller wraps the result in a new
//! snapshot, so older snapshots held by history stay untouched.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cell::{CellType, CellValue};
use crate::cell_id::RowId;
use crate::error::SheetError;

/// One record of the grid, keyed by column key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    #[serde(flatten)]
    pub cells: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn new(id: RowId) -> Self {
        Self { id, cells: BTreeMap::new() }
    }

    /// Build a row holding the type default for every column.
    pub fn with_defaults(id: RowId, columns: &[ColumnDef], today: NaiveDate) -> Self {
        let cells = columns
            .iter()
            .map(|c| (c.key.clone(), c.kind.default_value(today)))
            .collect();
        Self { id, cells }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.get(key)
    }

    /// Copy of this row with one cell replaced.
    pub fn with_value(&self, key: &str, value: CellValue) -> Self {
        let mut row = self.clone();
        row.cells.insert(key.to_string(), value);
        row
    }
}

/// Column definition. `key` never changes once created; `name` is display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub key: String,
    pub name: String,
    pub width: f32,
    pub editable: bool,
    pub resizable: bool,
    #[serde(rename = "type")]
    pub kind: CellType,
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, name: impl Into<String>, kind: CellType, width: f32) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            width,
            editable: true,
            resizable: true,
            kind,
        }
    }
}

pub fn find_column<'a>(columns: &'a [ColumnDef], key: &str) -> Option<&'a ColumnDef> {
    columns.iter().find(|c| c.key == key)
}

/// Look a column up by display name, ignoring ASCII case.
pub fn column_by_name<'a>(columns: &'a [ColumnDef], name: &str) -> Option<&'a ColumnDef> {
    columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

pub fn append_row(rows: &[Row], row: Row) -> Vec<Row> {
    let mut next = rows.to_vec();
    next.push(row);
    next
}

pub fn remove_rows(rows: &[Row], selected: &HashSet<RowId>) -> Vec<Row> {
    rows.iter().filter(|r| !selected.contains(&r.id)).cloned().collect()
}

/// Append a column and give every existing row its default value.
pub fn append_column(
    columns: &[ColumnDef],
    rows: &[Row],
    column: ColumnDef,
    today: NaiveDate,
) -> (Vec<ColumnDef>, Vec<Row>) {
    let default = column.kind.default_value(today);
    let next_rows = rows
        .iter()
        .map(|r| r.with_value(&column.key, default.clone()))
        .collect();
    let mut next_cols = columns.to_vec();
    next_cols.push(column);
    (next_cols, next_rows)
}

/// Remove a column definition. Row data under the key is left in place.
pub fn remove_column(columns: &[ColumnDef], key: &str) -> Result<Vec<ColumnDef>, SheetError> {
    if find_column(columns, key).is_none() {
        return Err(SheetError::UnknownColumn(key.to_string()));
    }
    if columns.len() <= 1 {
        return Err(SheetError::LastColumn);
    }
    Ok(columns.iter().filter(|c| c.key != key).cloned().collect())
}

/// Change a column's type and reset every row's value under it.
pub fn retype_column(
    columns: &[ColumnDef],
    rows: &[Row],
    key: &str,
    kind: CellType,
    today: NaiveDate,
) -> Result<(Vec<ColumnDef>, Vec<Row>), SheetError> {
    if find_column(columns, key).is_none() {
        return Err(SheetError::UnknownColumn(key.to_string()));
    }
    let next_cols = columns
        .iter()
        .map(|c| {
            if c.key == key {
                ColumnDef { kind, ..c.clone() }
            } else {
                c.clone()
            }
        })
        .collect();
    let default = kind.default_value(today);
    let next_rows = rows.iter().map(|r| r.with_value(key, default.clone())).collect();
    Ok((next_cols, next_rows))
}

/// Move `dragged` to the position currently held by `target`.
/// Returns `None` when nothing would change.
pub fn reorder_columns(columns: &[ColumnDef], dragged: &str, target: &str) -> Option<Vec<ColumnDef>> {
    if dragged == target {
        return None;
    }
    let from = columns.iter().position(|c| c.key == dragged)?;
    let to = columns.iter().position(|c| c.key == target)?;
    let mut next = columns.to_vec();
    let moved = next.remove(from);
    next.insert(to, moved);
    Some(next)
}

pub fn map_column(
    columns: &[ColumnDef],
    key: &str,
    f: impl Fn(&ColumnDef) -> ColumnDef,
) -> Result<Vec<ColumnDef>, SheetError> {
    if find_column(columns, key).is_none() {
        return Err(SheetError::UnknownColumn(key.to_string()));
    }
    Ok(columns
        .iter()
        .map(|c| if c.key == key { f(c) } else { c.clone() })
        .collect())
}

/// One history entry: rows and columns together, so a compound edit
/// (new column plus every row rewritten) is a single undo step.
///
/// Halves are shared; an edit that only touches rows reuses the columns `Arc`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub rows: Arc<Vec<Row>>,
    pub columns: Arc<Vec<ColumnDef>>,
}

impl Snapshot {
    pub fn new(rows: Vec<Row>, columns: Vec<ColumnDef>) -> Self {
        Self {
            rows: Arc::new(rows),
            columns: Arc::new(columns),
        }
    }

    pub fn with_rows(&self, rows: Vec<Row>) -> Self {
        Self {
            rows: Arc::new(rows),
            columns: Arc::clone(&self.columns),
        }
    }

    pub fn with_columns(&self, columns: Vec<ColumnDef>) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            columns: Arc::new(columns),
        }
    }
}
