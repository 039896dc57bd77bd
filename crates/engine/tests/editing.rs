// End-to-end editing behaviour through SheetDocument.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use sheetcraft_engine::cell::{Alignment, CellType, CellValue, FormatPatch};
use sheetcraft_engine::cell_id::{CellRef, RowId};
use sheetcraft_engine::document::{Clock, FixedClock, SheetConfig, SheetDocument};
use sheetcraft_engine::events::{ChangeKind, EventCollector};
use sheetcraft_engine::sheet::{ColumnDef, Row};
use sheetcraft_engine::shortcuts::ShortcutDispatcher;
use sheetcraft_engine::template::{Seed, SeedOptions, Template};
use sheetcraft_engine::SheetError;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
}

fn clock() -> Box<dyn Clock> {
    Box::new(FixedClock { millis: 1_720_000_000_000, today: today() })
}

/// Column "A" holds 10 and 20; column "B" is text.
fn numbers_doc() -> SheetDocument {
    let columns = vec![
        ColumnDef::new("a", "A", CellType::Number, 150.0),
        ColumnDef::new("b", "B", CellType::Text, 150.0),
    ];
    let rows = vec![
        Row::with_defaults(RowId::new("1"), &columns, today()).with_value("a", CellValue::Number(10.0)),
        Row::with_defaults(RowId::new("2"), &columns, today()).with_value("a", CellValue::Number(20.0)),
    ];
    SheetDocument::with_clock(Seed { title: "Numbers".into(), columns, rows }, SheetConfig::default(), clock())
}

fn blank_doc(rows: usize, cols: usize) -> SheetDocument {
    let seed = Template::Blank.seed(
        &SeedOptions { blank_rows: rows, blank_columns: cols, column_width: 150.0 },
        today(),
    );
    SheetDocument::with_clock(seed, SheetConfig::default(), clock())
}

fn collect_saves(doc: &mut SheetDocument) -> Arc<Mutex<EventCollector>> {
    let collector = Arc::new(Mutex::new(EventCollector::new()));
    let sink = Arc::clone(&collector);
    doc.set_on_save(Box::new(move |event| sink.lock().unwrap().push(event)));
    collector
}

// ---------------------------------------------------------------------------
// Default values
// ---------------------------------------------------------------------------

#[test]
fn insert_row_fills_type_defaults() {
    let columns: Vec<ColumnDef> = CellType::ALL
        .iter()
        .map(|t| ColumnDef::new(t.as_str(), t.as_str(), *t, 150.0))
        .collect();
    let seed = Seed { title: "types".into(), columns, rows: vec![] };
    let mut doc = SheetDocument::with_clock(seed, SheetConfig::default(), clock());

    doc.insert_row();
    let row = &doc.rows()[0];
    assert_eq!(row.get("text"), Some(&CellValue::Text(String::new())));
    assert_eq!(row.get("number"), Some(&CellValue::Number(0.0)));
    assert_eq!(row.get("currency"), Some(&CellValue::Number(0.0)));
    assert_eq!(row.get("date"), Some(&CellValue::Text("2024-07-15".into())));
    assert_eq!(row.get("checkbox"), Some(&CellValue::Bool(false)));
    assert_eq!(row.get("url"), Some(&CellValue::Text(String::new())));
    assert_eq!(row.get("priority"), Some(&CellValue::Text("low".into())));
    assert_eq!(row.get("status"), Some(&CellValue::Text("todo".into())));
}

#[test]
fn insert_column_fills_every_row_in_one_step() {
    let mut doc = numbers_doc();
    for kind in CellType::ALL {
        let key = doc.insert_column(kind);
        let expected = kind.default_value(today());
        assert!(doc.rows().iter().all(|r| r.get(&key) == Some(&expected)), "{kind}");
    }
    assert_eq!(doc.columns().len(), 10);
    assert_eq!(doc.columns()[2].name, "Column 3");
    assert_eq!(doc.columns()[2].width, 150.0);

    // Undo removes the last column and its row values together
    assert!(doc.undo());
    assert_eq!(doc.columns().len(), 9);
    let last = doc.columns().last().unwrap().key.clone();
    assert!(doc.rows().iter().all(|r| r.get(&last).is_some()));
}

#[test]
fn inserted_keys_are_unique_within_one_millisecond() {
    let mut doc = numbers_doc();
    let keys: HashSet<String> = (0..25).map(|_| doc.insert_column(CellType::Text)).collect();
    assert_eq!(keys.len(), 25);
    let ids: HashSet<RowId> = (0..25).map(|_| doc.insert_row()).collect();
    assert_eq!(ids.len(), 25);
}

// ---------------------------------------------------------------------------
// Structural edits
// ---------------------------------------------------------------------------

#[test]
fn deleting_the_last_column_is_rejected() {
    let mut doc = blank_doc(3, 1);
    let before = doc.history_len();
    assert_eq!(doc.delete_column("a"), Err(SheetError::LastColumn));
    assert_eq!(doc.status_message(), Some("Cannot delete the last column"));
    assert_eq!(doc.columns().len(), 1);
    assert_eq!(doc.rows().len(), 3);
    assert_eq!(doc.history_len(), before);
}

#[test]
fn delete_column_leaves_row_data() {
    let mut doc = numbers_doc();
    doc.delete_column("b").unwrap();
    assert_eq!(doc.columns().len(), 1);
    assert!(doc.rows()[0].get("b").is_some());
}

#[test]
fn delete_rows_needs_a_selection() {
    let mut doc = numbers_doc();
    assert_eq!(doc.delete_selected_rows(), Err(SheetError::EmptyRowSelection));
    assert_eq!(doc.status_message(), Some("Select rows to delete"));
    assert_eq!(doc.rows().len(), 2);

    doc.toggle_row_selection(0).unwrap();
    assert_eq!(doc.delete_selected_rows(), Ok(1));
    assert_eq!(doc.rows().len(), 1);
    assert_eq!(doc.rows()[0].id, RowId::new("2"));
    assert!(doc.selection().rows().is_empty());
}

#[test]
fn change_column_type_resets_values() {
    let mut doc = numbers_doc();
    doc.set_cell_value(&CellRef::new(0, "b"), "free text").unwrap();
    doc.change_column_type("b", CellType::Checkbox).unwrap();
    assert_eq!(doc.columns()[1].kind, CellType::Checkbox);
    assert!(doc.rows().iter().all(|r| r.get("b") == Some(&CellValue::Bool(false))));
    assert_eq!(
        doc.change_column_type("zz", CellType::Text),
        Err(SheetError::UnknownColumn("zz".into()))
    );
}

#[test]
fn rename_keeps_key() {
    let mut doc = numbers_doc();
    doc.rename_column("a", "Amount").unwrap();
    assert_eq!(doc.columns()[0].key, "a");
    assert_eq!(doc.columns()[0].name, "Amount");
    assert_eq!(doc.cell_ref("amount2"), Some(CellRef::new(1, "a")));
}

// ---------------------------------------------------------------------------
// Cell types and formats
// ---------------------------------------------------------------------------

#[test]
fn cell_type_override_touches_one_cell() {
    let mut doc = numbers_doc();
    let cell = CellRef::new(1, "a");
    assert_eq!(doc.cell_type(&cell), Some(CellType::Number));

    doc.change_cell_type(&cell, CellType::Status).unwrap();
    assert_eq!(doc.cell_type(&cell), Some(CellType::Status));
    assert_eq!(doc.cell_type(&CellRef::new(0, "a")), Some(CellType::Number));
    assert_eq!(doc.cell_value(&cell), Some(&CellValue::Text("todo".into())));
    assert_eq!(doc.cell_value(&CellRef::new(0, "a")), Some(&CellValue::Number(10.0)));
}

#[test]
fn override_follows_the_row_after_structural_edits() {
    let mut doc = numbers_doc();
    doc.select_cell(CellRef::new(1, "a"));
    doc.toggle_bold().unwrap();
    doc.change_cell_type(&CellRef::new(1, "a"), CellType::Checkbox).unwrap();

    doc.delete_rows(&HashSet::from([RowId::new("1")])).unwrap();
    // The formerly second row is now at index 0 and keeps its overrides
    assert!(doc.cell_format(&CellRef::new(0, "a")).bold);
    assert_eq!(doc.cell_type(&CellRef::new(0, "a")), Some(CellType::Checkbox));
}

#[test]
fn apply_format_needs_a_cell_and_is_idempotent() {
    let mut doc = numbers_doc();
    assert_eq!(doc.apply_format(&FormatPatch::bold(true)), Err(SheetError::NoCellSelected));

    let cell = CellRef::new(0, "a");
    doc.select_cell(cell.clone());
    doc.apply_format(&FormatPatch::bold(true)).unwrap();
    let once = doc.cell_format(&cell);
    doc.apply_format(&FormatPatch::bold(true)).unwrap();
    assert_eq!(doc.cell_format(&cell), once);

    let align = FormatPatch { align: Some(Alignment::Center), ..FormatPatch::default() };
    doc.apply_format(&align).unwrap();
    let merged = doc.cell_format(&cell);
    assert!(merged.bold);
    assert_eq!(merged.align, Alignment::Center);
}

#[test]
fn cell_style_defaults_and_wrap() {
    let mut doc = numbers_doc();
    let cell = CellRef::new(0, "b");
    let style = doc.cell_style(&cell);
    assert_eq!(style.font_size, "12px");
    assert_eq!(style.color, "#000000");
    assert_eq!(style.background_color, "#ffffff");
    assert_eq!(style.text_align, "left");
    assert_eq!(style.white_space, "nowrap");

    doc.select_cell(cell.clone());
    doc.toggle_underline().unwrap();
    doc.toggle_strikethrough().unwrap();
    doc.toggle_text_wrap("b").unwrap();
    let style = doc.cell_style(&cell);
    assert_eq!(style.text_decoration, "underline line-through");
    assert_eq!(style.white_space, "pre-wrap");

    assert_eq!(doc.clear_format(), Ok(true));
    assert_eq!(doc.cell_style(&cell).text_decoration, "none");
}

// ---------------------------------------------------------------------------
// Clipboard
// ---------------------------------------------------------------------------

#[test]
fn copy_paste_repeats() {
    let mut doc = numbers_doc();
    assert_eq!(doc.paste(), Err(SheetError::NoCellSelected));
    doc.select_cell(CellRef::new(0, "b"));
    assert_eq!(doc.paste(), Err(SheetError::NothingToPaste));
    assert_eq!(doc.status_message(), Some("Clipboard is empty"));

    doc.select_cell(CellRef::new(1, "a"));
    doc.copy().unwrap();
    doc.select_cell(CellRef::new(0, "b"));
    doc.paste().unwrap();
    doc.select_cell(CellRef::new(1, "b"));
    doc.paste().unwrap();
    assert_eq!(doc.cell_value(&CellRef::new(0, "b")), Some(&CellValue::Number(20.0)));
    assert_eq!(doc.cell_value(&CellRef::new(1, "b")), Some(&CellValue::Number(20.0)));
    assert!(!doc.clipboard().is_empty());
}

#[test]
fn cut_clears_source_and_pushes() {
    let mut doc = numbers_doc();
    doc.select_cell(CellRef::new(0, "a"));
    doc.cut().unwrap();
    assert_eq!(doc.cell_value(&CellRef::new(0, "a")), Some(&CellValue::Text(String::new())));
    assert_eq!(doc.history_len(), 2);
    doc.select_cell(CellRef::new(1, "b"));
    doc.paste().unwrap();
    assert_eq!(doc.cell_value(&CellRef::new(1, "b")), Some(&CellValue::Number(10.0)));
}

// ---------------------------------------------------------------------------
// Row sizing
// ---------------------------------------------------------------------------

#[test]
fn row_height_follows_wrapped_lines() {
    let mut doc = numbers_doc();
    doc.set_cell_value(&CellRef::new(0, "b"), "one\ntwo\nthree").unwrap();
    assert_eq!(doc.row_height(0), 36.0);
    assert!(doc.toggle_text_wrap("b").unwrap());
    assert_eq!(doc.row_height(0), 76.0);
    assert_eq!(doc.row_height(1), 36.0);
    assert!(!doc.toggle_text_wrap("b").unwrap());
    assert_eq!(doc.row_height(0), 36.0);
}

#[test]
fn deleted_wrapped_column_stops_sizing_rows() {
    let mut doc = numbers_doc();
    doc.set_cell_value(&CellRef::new(0, "b"), "1\n2\n3\n4").unwrap();
    doc.toggle_text_wrap("b").unwrap();
    assert_eq!(doc.row_height(0), 96.0);

    doc.delete_column("b").unwrap();
    assert_eq!(doc.row_height(0), 36.0);

    // Undo brings the column back, and its wrap with it
    assert!(doc.undo());
    assert_eq!(doc.row_height(0), 96.0);
}

// ---------------------------------------------------------------------------
// Protection
// ---------------------------------------------------------------------------

#[test]
fn protected_cell_rejects_edits_but_neighbours_do_not() {
    let mut doc = numbers_doc();
    let locked = CellRef::new(0, "a");
    doc.select_cell(locked.clone());
    assert_eq!(doc.toggle_protect_cell(), Ok(true));
    assert!(doc.is_cell_protected(&locked));
    let pushes = doc.history_len();

    assert!(matches!(doc.set_cell_value(&locked, "99"), Err(SheetError::CellProtected { .. })));
    assert!(doc.status_message().unwrap().starts_with("Cell is protected"));
    assert!(doc.change_cell_type(&locked, CellType::Text).is_err());
    doc.copy().unwrap();
    assert!(doc.paste().is_err());
    assert!(doc.cut().is_err());
    assert_eq!(doc.history_len(), pushes);
    assert_eq!(doc.cell_value(&locked), Some(&CellValue::Number(10.0)));

    // Same column, other row stays editable
    assert_eq!(doc.set_cell_value(&CellRef::new(1, "a"), "99"), Ok(true));

    doc.select_cell(locked.clone());
    assert_eq!(doc.toggle_protect_cell(), Ok(false));
    assert_eq!(doc.set_cell_value(&locked, "99"), Ok(true));
}

#[test]
fn read_only_column_rejects_edits() {
    let mut columns = vec![ColumnDef::new("id", "ID", CellType::Text, 80.0)];
    columns[0].editable = false;
    let rows = vec![Row::with_defaults(RowId::new("1"), &columns, today())];
    let mut doc = SheetDocument::with_clock(Seed { title: "ro".into(), columns, rows }, SheetConfig::default(), clock());
    assert_eq!(
        doc.set_cell_value(&CellRef::new(0, "id"), "x"),
        Err(SheetError::ReadOnlyColumn("id".into()))
    );
}

// ---------------------------------------------------------------------------
// Formulas through the document
// ---------------------------------------------------------------------------

#[test]
fn formula_examples() {
    let doc = numbers_doc();
    assert_eq!(doc.evaluate("=SUM(A1:A2)").to_string(), "30");
    assert_eq!(doc.evaluate("=AVERAGE(A1:A2)").to_string(), "15");
    assert_eq!(doc.evaluate("hello").to_string(), "hello");
    assert_eq!(doc.evaluate("=A1+A2").to_string(), "30");
    assert_eq!(doc.evaluate("=SUM(Z1:Z2)").to_string(), "#ERROR");
}

#[test]
fn formula_cells_render_evaluated() {
    let mut doc = blank_doc(3, 2);
    doc.set_cell_value(&CellRef::new(0, "a"), "4").unwrap();
    doc.set_cell_value(&CellRef::new(1, "a"), "6").unwrap();
    doc.set_cell_value(&CellRef::new(2, "a"), "=SUM(A1:A2)/2").unwrap();
    assert_eq!(doc.display_value(&CellRef::new(2, "a")), "5");
    doc.set_cell_value(&CellRef::new(0, "b"), "=A3*").unwrap();
    assert_eq!(doc.display_value(&CellRef::new(0, "b")), "#ERROR");
}

// ---------------------------------------------------------------------------
// Notifications and shortcuts
// ---------------------------------------------------------------------------

#[test]
fn save_callback_fires_after_each_mutation() {
    let mut doc = numbers_doc();
    let saves = collect_saves(&mut doc);

    doc.insert_row();
    doc.select_cell(CellRef::new(0, "a"));
    doc.toggle_protect_cell().unwrap();
    doc.toggle_text_wrap("b").unwrap();
    doc.toggle_italic().unwrap();
    let _ = doc.delete_selected_rows();
    doc.undo();

    let saves = saves.lock().unwrap();
    assert_eq!(
        saves.kinds(),
        vec![
            ChangeKind::RowInserted,
            ChangeKind::ProtectionToggled,
            ChangeKind::WrapToggled,
            ChangeKind::FormatChanged,
            ChangeKind::Undo,
        ]
    );
    assert_eq!(saves.last().unwrap().snapshot.rows.len(), 2);
}

#[test]
fn lock_hooks_reach_the_host() {
    let mut doc = numbers_doc();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    doc.hooks_mut().on_lock_row = Some(Box::new(move |id: RowId| sink.lock().unwrap().push(id)));

    assert_eq!(doc.lock_row(1), Ok(true));
    assert_eq!(doc.lock_column("a"), Ok(false));
    assert!(doc.lock_row(9).is_err());
    assert_eq!(*seen.lock().unwrap(), vec![RowId::new("2")]);
}

#[test]
fn shortcuts_route_only_while_attached() {
    let mut doc = numbers_doc();
    let mut keys = ShortcutDispatcher::with_defaults();
    doc.select_cell(CellRef::new(0, "a"));

    assert!(!keys.dispatch("ctrl+b", &mut doc));
    assert!(!doc.cell_format(&CellRef::new(0, "a")).bold);

    keys.attach();
    assert!(keys.dispatch("Ctrl+B", &mut doc));
    assert!(doc.cell_format(&CellRef::new(0, "a")).bold);

    doc.set_cell_value(&CellRef::new(0, "b"), "first").unwrap();
    assert!(keys.dispatch("cmd+z", &mut doc));
    assert_eq!(doc.cell_value(&CellRef::new(0, "b")), Some(&CellValue::Text(String::new())));
    assert!(keys.dispatch("ctrl+shift+z", &mut doc));
    assert_eq!(doc.cell_value(&CellRef::new(0, "b")), Some(&CellValue::Text("first".into())));

    keys.dispatch("ctrl+c", &mut doc);
    doc.select_cell(CellRef::new(1, "b"));
    keys.dispatch("ctrl+v", &mut doc);
    assert_eq!(doc.cell_value(&CellRef::new(1, "b")), Some(&CellValue::Number(10.0)));

    assert!(!keys.dispatch("ctrl+q", &mut doc));
    keys.detach();
    assert!(!keys.dispatch("ctrl+z", &mut doc));
}
