//! Seed sheets for opening a document.

use std::fmt;

use chrono::NaiveDate;

use crate::cell::{CellType, CellValue};
use crate::cell_id::{col_to_letters, RowId};
use crate::error::SheetError;
use crate::sheet::{ColumnDef, Row};

/// Initial content of a sheet: `{ columns, rows, title }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Seed {
    pub title: String,
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Budget,
    Timeline,
    Inventory,
    Blank,
}

/// Shape parameters for seeding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedOptions {
    pub blank_rows: usize,
    pub blank_columns: usize,
    pub column_width: f32,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            blank_rows: 50,
            blank_columns: 26,
            column_width: 150.0,
        }
    }
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::Budget,
        Template::Timeline,
        Template::Inventory,
        Template::Blank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Budget => "budget",
            Template::Timeline => "timeline",
            Template::Inventory => "inventory",
            Template::Blank => "blank",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, SheetError> {
        let needle = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| SheetError::UnknownTemplate(name.to_string()))
    }

    pub fn seed(&self, options: &SeedOptions, today: NaiveDate) -> Seed {
        match self {
            Template::Budget => budget(options.column_width),
            Template::Timeline => timeline(options.column_width, today),
            Template::Inventory => inventory(options.column_width),
            Template::Blank => blank(options, today),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn num(n: f64) -> CellValue {
    CellValue::Number(n)
}

/// Zip a fixed column list with literal row data. Row ids are 1-based strings.
fn build_rows(columns: &[ColumnDef], data: Vec<Vec<CellValue>>) -> Vec<Row> {
    data.into_iter()
        .enumerate()
        .map(|(i, values)| Row {
            id: RowId::new((i + 1).to_string()),
            cells: columns.iter().map(|c| c.key.clone()).zip(values).collect(),
        })
        .collect()
}

fn budget(width: f32) -> Seed {
    let columns = vec![
        ColumnDef::new("category", "Category", CellType::Text, width),
        ColumnDef::new("budgeted", "Budgeted", CellType::Currency, width),
        ColumnDef::new("actual", "Actual", CellType::Currency, width),
        ColumnDef::new("paid", "Paid", CellType::Checkbox, width),
    ];
    let rows = build_rows(
        &columns,
        vec![
            vec![text("Rent"), num(1500.0), num(1500.0), CellValue::Bool(true)],
            vec![text("Groceries"), num(400.0), num(362.5), CellValue::Bool(false)],
            vec![text("Utilities"), num(180.0), num(0.0), CellValue::Bool(false)],
            vec![text("Savings"), num(500.0), num(500.0), CellValue::Bool(true)],
        ],
    );
    Seed { title: "Monthly Budget".to_string(), columns, rows }
}

fn timeline(width: f32, today: NaiveDate) -> Seed {
    let columns = vec![
        ColumnDef::new("task", "Task", CellType::Text, width),
        ColumnDef::new("owner", "Owner", CellType::Text, width),
        ColumnDef::new("due", "Due", CellType::Date, width),
        ColumnDef::new("priority", "Priority", CellType::Priority, width),
        ColumnDef::new("status", "Status", CellType::Status, width),
    ];
    let date = |days: i64| text(&(today + chrono::Duration::days(days)).format("%Y-%m-%d").to_string());
    let rows = build_rows(
        &columns,
        vec![
            vec![text("Kickoff"), text("Dana"), date(0), text("high"), text("done")],
            vec![text("Design review"), text("Lee"), date(7), text("medium"), text("in-progress")],
            vec![text("Launch"), text("Sam"), date(30), text("high"), text("todo")],
        ],
    );
    Seed { title: "Project Timeline".to_string(), columns, rows }
}

fn inventory(width: f32) -> Seed {
    let columns = vec![
        ColumnDef::new("item", "Item", CellType::Text, width),
        ColumnDef::new("sku", "SKU", CellType::Text, width),
        ColumnDef::new("quantity", "Quantity", CellType::Number, width),
        ColumnDef::new("unit_price", "Unit Price", CellType::Currency, width),
        ColumnDef::new("supplier", "Supplier", CellType::Url, width),
        ColumnDef::new("in_stock", "In Stock", CellType::Checkbox, width),
    ];
    let rows = build_rows(
        &columns,
        vec![
            vec![
                text("Widget"),
                text("WDG-001"),
                num(120.0),
                num(2.5),
                text("https://example.com/widgets"),
                CellValue::Bool(true),
            ],
            vec![
                text("Gadget"),
                text("GDG-002"),
                num(0.0),
                num(14.0),
                text("https://example.com/gadgets"),
                CellValue::Bool(false),
            ],
        ],
    );
    Seed { title: "Inventory".to_string(), columns, rows }
}

/// `blank_rows` x `blank_columns` text grid with columns named A, B, .. AA.
fn blank(options: &SeedOptions, today: NaiveDate) -> Seed {
    let columns: Vec<ColumnDef> = (0..options.blank_columns)
        .map(|i| {
            let letters = col_to_letters(i);
            ColumnDef::new(letters.to_ascii_lowercase(), letters, CellType::Text, options.column_width)
        })
        .collect();
    let rows = (0..options.blank_rows)
        .map(|i| Row::with_defaults(RowId::new((i + 1).to_string()), &columns, today))
        .collect();
    Seed { title: "Untitled".to_string(), columns, rows }
}
