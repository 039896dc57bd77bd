//! Text wrap flags and derived row/column sizes.

use std::collections::BTreeSet;

use crate::sheet::{ColumnDef, Row};

/// Sizing constants, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub min_row_height: f32,
    pub line_height: f32,
    pub row_padding: f32,
    pub default_column_width: f32,
    pub min_column_width: f32,
    pub max_column_width: f32,
    /// Approximate glyph advance used by auto-sizing
    pub char_width: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_row_height: 36.0,
            line_height: 20.0,
            row_padding: 16.0,
            default_column_width: 150.0,
            min_column_width: 60.0,
            max_column_width: 600.0,
            char_width: 8.0,
        }
    }
}

/// Column keys with text wrapping enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapColumns {
    keys: BTreeSet<String>,
}

impl WrapColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip wrapping for a column. Returns the new state.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.keys.remove(key) {
            false
        } else {
            self.keys.insert(key.to_string());
            true
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

/// Height of a row: the tallest wrapped cell, never below the floor.
///
/// Only wrap-enabled columns still in `columns` contribute; each contributes
/// `lines * line_height + row_padding`. Computed fresh on every call.
pub fn row_height(row: &Row, columns: &[ColumnDef], wrap: &WrapColumns, config: &LayoutConfig) -> f32 {
    wrap.iter()
        .filter(|key| columns.iter().any(|c| c.key == *key))
        .map(|key| {
            let text = row.get(key).map(|v| v.to_string()).unwrap_or_default();
            let lines = text.split('\n').count() as f32;
            lines * config.line_height + config.row_padding
        })
        .fold(config.min_row_height, f32::max)
}

/// Width that fits the header and the longest line of any value.
pub fn fit_column_width<I, S>(column: &ColumnDef, texts: I, config: &LayoutConfig) -> f32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let widest = texts
        .into_iter()
        .flat_map(|t| {
            t.as_ref()
                .split('\n')
                .map(|line| line.chars().count())
                .collect::<Vec<_>>()
        })
        .chain(std::iter::once(column.name.chars().count()))
        .max()
        .unwrap_or(0);

    (widest as f32 * config.char_width + 24.0).clamp(config.min_column_width, config.max_column_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellType, CellValue};
    use crate::cell_id::RowId;

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("notes", "Notes", CellType::Text, 150.0),
            ColumnDef::new("title", "Title", CellType::Text, 150.0),
        ]
    }

    fn row_with(text: &str) -> Row {
        let mut row = Row::new(RowId::new("1"));
        row.cells.insert("notes".into(), CellValue::Text(text.into()));
        row.cells.insert("title".into(), CellValue::Text("x".into()));
        row
    }

    #[test]
    fn test_three_lines_when_wrapped() {
        let mut wrap = WrapColumns::new();
        wrap.toggle("notes");
        let h = row_height(&row_with("a\nb\nc"), &columns(), &wrap, &LayoutConfig::default());
        assert_eq!(h, 76.0);
    }

    #[test]
    fn test_floor_when_not_wrapped() {
        let h = row_height(&row_with("a\nb\nc"), &columns(), &WrapColumns::new(), &LayoutConfig::default());
        assert_eq!(h, 36.0);
    }

    #[test]
    fn test_single_line_wrapped_stays_at_floor() {
        let mut wrap = WrapColumns::new();
        wrap.toggle("title");
        assert_eq!(row_height(&row_with("a"), &columns(), &wrap, &LayoutConfig::default()), 36.0);
    }

    #[test]
    fn test_wrap_on_missing_column_is_ignored() {
        let mut wrap = WrapColumns::new();
        wrap.toggle("notes");
        let only_title = vec![ColumnDef::new("title", "Title", CellType::Text, 150.0)];
        assert_eq!(row_height(&row_with("a\nb\nc"), &only_title, &wrap, &LayoutConfig::default()), 36.0);
    }

    #[test]
    fn test_toggle() {
        let mut wrap = WrapColumns::new();
        assert!(wrap.toggle("a"));
        assert!(wrap.contains("a"));
        assert!(!wrap.toggle("a"));
        assert!(!wrap.contains("a"));
    }

    #[test]
    fn test_fit_column_width() {
        let config = LayoutConfig::default();
        let col = ColumnDef::new("k", "Name", CellType::Text, 150.0);
        assert_eq!(fit_column_width(&col, ["a fairly long value"], &config), 19.0 * 8.0 + 24.0);
        assert_eq!(fit_column_width(&col, Vec::<String>::new(), &config), 60.0);
        let huge = "x".repeat(500);
        assert_eq!(fit_column_width(&col, [huge], &config), 600.0);
    }
}
