//! Plain-text grid output.

use std::io::{self, Write};

use sheetcraft_engine::cell_id::CellRef;
use sheetcraft_engine::SheetDocument;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Pixels per printed character.
const CHAR_WIDTH: f32 = 8.0;

/// First line of `s`, padded or cut to exactly `width` display columns.
/// Cut text ends in "..".
fn fit(s: &str, width: usize) -> String {
    let first = s.lines().next().unwrap_or("");
    let used = UnicodeWidthStr::width(first);
    if used <= width {
        return format!("{}{}", first, " ".repeat(width - used));
    }

    let budget = width.saturating_sub(2);
    let mut taken = 0;
    let mut out = String::new();
    for ch in first.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if taken + cw > budget {
            break;
        }
        taken += cw;
        out.push(ch);
    }
    out.push_str("..");
    out.push_str(&" ".repeat(width.saturating_sub(taken + 2)));
    out
}

/// Print title, header and every row. Formula cells show their result,
/// wrapped cells their first line. Protected cells are marked with `*`.
pub fn render_grid(doc: &SheetDocument, out: &mut impl Write) -> io::Result<()> {
    let columns = doc.columns();
    let widths: Vec<usize> = columns
        .iter()
        .map(|c| ((c.width / CHAR_WIDTH) as usize).clamp(4, 40))
        .collect();

    writeln!(out, "# {}", doc.title())?;
    let mut header = String::from("    |");
    for (column, width) in columns.iter().zip(&widths) {
        header.push_str(&fit(&column.name, *width));
        header.push('|');
    }
    writeln!(out, "{}", header.trim_end())?;

    for row in 0..doc.rows().len() {
        let mut line = format!("{:>4}|", row + 1);
        for (column, width) in columns.iter().zip(&widths) {
            let cell = CellRef::new(row, column.key.clone());
            let mut text = doc.display_value(&cell);
            if doc.is_cell_protected(&cell) {
                text.insert(0, '*');
            }
            line.push_str(&fit(&text, *width));
            line.push('|');
        }
        writeln!(out, "{}", line)?;
    }
    Ok(())
}
