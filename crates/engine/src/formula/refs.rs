//! Textual cell references: `<ColumnName><RowNumber>`, e.g. `A1`, `amount12`.
//!
//! Column names are matched against column display names, ignoring case.
//! Row numbers are 1-based in formulas and 0-based everywhere else.

use once_cell::sync::Lazy;
use regex::Regex;

/// Any `<letters><digits>` token standing on its own.
pub(crate) static CELL_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z]+)([0-9]+)\b").expect("valid cell reference pattern"));

/// `SUM(A1:A5)` / `AVERAGE(a1:b3)`, any case, optional inner whitespace.
pub(crate) static RANGE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(SUM|AVERAGE)\(\s*([A-Z]+)([0-9]+)\s*:\s*([A-Z]+)([0-9]+)\s*\)")
        .expect("valid range function pattern")
});

/// A parsed `<letters><digits>` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub column: String,
    /// 0-based row index
    pub row: usize,
}

/// Parse a whole string as one address. Row `0` is not addressable.
pub fn parse_address(s: &str) -> Option<Address> {
    let s = s.trim();
    let split = s.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = s.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let number: usize = digits.parse().ok()?;
    Some(Address {
        column: letters.to_string(),
        row: number.checked_sub(1)?,
    })
}
