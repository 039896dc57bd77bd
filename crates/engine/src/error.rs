use std::fmt;

/// Rejected edit. The `Display` text is the notice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    /// An operation needing an active cell ran without one.
    NoCellSelected,
    /// Paste with an empty clipboard.
    NothingToPaste,
    /// Delete rows with an empty row selection.
    EmptyRowSelection,
    /// Deleting the only remaining column.
    LastColumn,
    /// Column key not present in the current column list.
    UnknownColumn(String),
    /// Row index past the end of the current rows.
    RowOutOfRange { row: usize, len: usize },
    /// Target cell is locked.
    CellProtected { row: usize, col: String },
    /// Target column is marked non-editable.
    ReadOnlyColumn(String),
    /// Resize attempted on a fixed-width column.
    NotResizable(String),
    /// Template name not in the known set.
    UnknownTemplate(String),
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCellSelected => write!(f, "Select a cell first"),
            Self::NothingToPaste => write!(f, "Clipboard is empty"),
            Self::EmptyRowSelection => write!(f, "Select rows to delete"),
            Self::LastColumn => write!(f, "Cannot delete the last column"),
            Self::UnknownColumn(key) => write!(f, "Unknown column: {key}"),
            Self::RowOutOfRange { row, len } => {
                write!(f, "Row {} is out of range ({len} rows)", row + 1)
            }
            Self::CellProtected { row, col } => {
                write!(f, "Cell is protected (row {}, column {col})", row + 1)
            }
            Self::ReadOnlyColumn(key) => write!(f, "Column {key} is read-only"),
            Self::NotResizable(key) => write!(f, "Column {key} cannot be resized"),
            Self::UnknownTemplate(name) => write!(f, "Unknown template: {name}"),
        }
    }
}

impl std::error::Error for SheetError {}
