pub mod cell;
pub mod cell_id;
pub mod cell_types;
pub mod clipboard;
pub mod document;
pub mod error;
pub mod events;
pub mod format;
pub mod formula;
pub mod history;
pub mod layout;
pub mod protection;
pub mod selection;
pub mod sheet;
pub mod shortcuts;
pub mod template;

pub use cell::{CellType, CellValue, FormatPatch};
pub use cell_id::{CellRef, RowId};
pub use document::{SheetConfig, SheetDocument};
pub use error::SheetError;
