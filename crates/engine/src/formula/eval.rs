//! Formula evaluation by textual substitution.
//!
//! Stages, in order:
//! 1. `SUM(<Col><R1>:<Col><R2>)` / `AVERAGE(...)` calls become numbers.
//! 2. Remaining `<Col><Row>` references become the referenced values.
//! 3. What is left must be plain arithmetic (see `parser`).
//!
//! Ranges are expanded before single references so the range syntax is
//! never half-substituted. Any failure yields `#ERROR`; nothing panics.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::cell::CellValue;
use crate::sheet::{column_by_name, ColumnDef, Row};

use super::parser;
use super::refs::{CELL_REF, RANGE_CALL};

/// In-cell sentinel for a formula that cannot be evaluated.
pub const ERROR_SENTINEL: &str = "#ERROR";

/// Deepest chain of formula cells referring to formula cells.
pub const MAX_NESTING: usize = 256;

/// Outcome of evaluating a cell's stored text.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaResult {
    /// Input was not a formula; returned unchanged.
    Passthrough(String),
    Number(f64),
    Error,
}

impl FormulaResult {
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaResult::Error)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaResult::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for FormulaResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaResult::Passthrough(s) => f.write_str(s),
            FormulaResult::Number(n) => write!(f, "{}", CellValue::Number(*n)),
            FormulaResult::Error => f.write_str(ERROR_SENTINEL),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum EvalError {
    UnknownColumn(String),
    Cycle { row: usize, col: String },
    TooDeep,
    Arithmetic(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownColumn(name) => write!(f, "unknown column '{name}'"),
            Self::Cycle { row, col } => write!(f, "circular reference through row {} column {col}", row + 1),
            Self::TooDeep => write!(f, "formula cells nested deeper than {}", MAX_NESTING),
            Self::Arithmetic(msg) => write!(f, "{msg}"),
        }
    }
}

/// Evaluate a cell's text against the given rows and columns.
pub fn evaluate(input: &str, rows: &[Row], columns: &[ColumnDef]) -> FormulaResult {
    let Some(body) = input.strip_prefix('=') else {
        return FormulaResult::Passthrough(input.to_string());
    };
    let mut evaluator = Evaluator {
        rows,
        columns,
        visiting: Vec::new(),
        resolved: FxHashMap::default(),
    };
    match evaluator.eval_body(body) {
        Ok(n) => FormulaResult::Number(n),
        Err(e) => {
            log::debug!("formula {:?} failed: {}", input, e);
            FormulaResult::Error
        }
    }
}

struct Evaluator<'a> {
    rows: &'a [Row],
    columns: &'a [ColumnDef],
    /// Cells whose formulas are on the current evaluation path
    visiting: Vec<(usize, String)>,
    /// Formula cells already evaluated during this call
    resolved: FxHashMap<(usize, String), f64>,
}

impl<'a> Evaluator<'a> {
    fn eval_body(&mut self, body: &str) -> Result<f64, EvalError> {
        let expanded = self.expand_ranges(body)?;
        let substituted = self.substitute_refs(&expanded)?;
        parser::eval_str(&substituted).map_err(EvalError::Arithmetic)
    }

    fn expand_ranges(&mut self, body: &str) -> Result<String, EvalError> {
        let mut out = String::with_capacity(body.len());
        let mut last = 0;
        for caps in RANGE_CALL.captures_iter(body) {
            let Some(whole) = caps.get(0) else { continue };
            let average = caps[1].eq_ignore_ascii_case("AVERAGE");
            let value = self.aggregate(&caps[2], &caps[3], &caps[4], &caps[5], average)?;
            out.push_str(&body[last..whole.start()]);
            out.push_str(&format_number(value));
            last = whole.end();
        }
        out.push_str(&body[last..]);
        Ok(out)
    }

    /// SUM or AVERAGE over a rectangular range. Undefined cells add nothing
    /// and, for AVERAGE, are left out of the divisor.
    fn aggregate(
        &mut self,
        start_col: &str,
        start_row: &str,
        end_col: &str,
        end_row: &str,
        average: bool,
    ) -> Result<f64, EvalError> {
        let keys = self.column_span(start_col, end_col)?;
        let r1: usize = start_row.parse().map_err(|_| EvalError::Arithmetic(format!("bad row {start_row}")))?;
        let r2: usize = end_row.parse().map_err(|_| EvalError::Arithmetic(format!("bad row {end_row}")))?;

        // Rows past the end are undefined and contribute nothing
        let last = r1.max(r2).min(self.rows.len());
        let mut sum = 0.0;
        let mut defined = 0usize;
        for number in r1.min(r2)..=last {
            let Some(row) = number.checked_sub(1) else { continue };
            for key in &keys {
                if let Some(n) = self.cell_number(row, key)? {
                    sum += n;
                    defined += 1;
                }
            }
        }

        if !average {
            return Ok(sum);
        }
        if defined == 0 {
            Ok(0.0)
        } else {
            Ok(sum / defined as f64)
        }
    }

    /// Column keys from `from` to `to` inclusive, in sheet order.
    fn column_span(&self, from: &str, to: &str) -> Result<Vec<String>, EvalError> {
        let position = |name: &str| {
            self.columns
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| EvalError::UnknownColumn(name.to_string()))
        };
        let a = position(from)?;
        let b = position(to)?;
        Ok(self.columns[a.min(b)..=a.max(b)].iter().map(|c| c.key.clone()).collect())
    }

    fn substitute_refs(&mut self, expr: &str) -> Result<String, EvalError> {
        let mut out = String::with_capacity(expr.len());
        let mut last = 0;
        for caps in CELL_REF.captures_iter(expr) {
            let Some(whole) = caps.get(0) else { continue };
            let replacement = self.reference_text(&caps[1], &caps[2])?;
            out.push_str(&expr[last..whole.start()]);
            out.push_str(&replacement);
            last = whole.end();
        }
        out.push_str(&expr[last..]);
        Ok(out)
    }

    /// Text substituted for one reference. Missing column, row or value read as "0".
    fn reference_text(&mut self, name: &str, number: &str) -> Result<String, EvalError> {
        let Some(column) = column_by_name(self.columns, name) else {
            return Ok("0".to_string());
        };
        let key = column.key.clone();
        let Some(row) = number.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
            return Ok("0".to_string());
        };
        let Some(value) = self.rows.get(row).and_then(|r| r.get(&key)) else {
            return Ok("0".to_string());
        };

        let text = match value {
            CellValue::Text(s) if s.starts_with('=') => {
                let s = s.clone();
                format_number(self.eval_nested(row, &key, &s)?)
            }
            CellValue::Text(s) if s.trim().is_empty() => "0".to_string(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        };
        Ok(text)
    }

    /// Numeric value of a cell for aggregation; `None` when undefined.
    fn cell_number(&mut self, row: usize, key: &str) -> Result<Option<f64>, EvalError> {
        let Some(value) = self.rows.get(row).and_then(|r| r.get(key)) else {
            return Ok(None);
        };
        match value {
            CellValue::Text(s) if s.starts_with('=') => {
                let s = s.clone();
                self.eval_nested(row, key, &s).map(Some)
            }
            other => Ok(Some(other.as_number())),
        }
    }

    fn eval_nested(&mut self, row: usize, key: &str, formula: &str) -> Result<f64, EvalError> {
        let cell = (row, key.to_string());
        if let Some(value) = self.resolved.get(&cell) {
            return Ok(*value);
        }
        if self.visiting.contains(&cell) {
            return Err(EvalError::Cycle { row, col: cell.1 });
        }
        if self.visiting.len() >= MAX_NESTING {
            return Err(EvalError::TooDeep);
        }
        self.visiting.push(cell.clone());
        let result = self.eval_body(&formula[1..]);
        self.visiting.pop();
        if let Ok(value) = result {
            self.resolved.insert(cell, value);
        }
        result
    }
}

/// Render a number for re-insertion into an expression.
fn format_number(n: f64) -> String {
    if n < 0.0 {
        // Parenthesised so "2*" + "-3" stays a single operand after concatenation
        format!("({})", n)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellType;
    use crate::cell_id::RowId;

    fn sheet(values: &[(&str, CellValue)]) -> (Vec<Row>, Vec<ColumnDef>) {
        let columns = vec![
            ColumnDef::new("col_a", "A", CellType::Number, 150.0),
            ColumnDef::new("col_b", "B", CellType::Number, 150.0),
        ];
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, (key, v))| {
                let mut row = Row::new(RowId::new(i.to_string()));
                row.cells.insert(key.to_string(), v.clone());
                row
            })
            .collect();
        (rows, columns)
    }

    fn ten_twenty() -> (Vec<Row>, Vec<ColumnDef>) {
        sheet(&[("col_a", CellValue::Number(10.0)), ("col_a", CellValue::Number(20.0))])
    }

    fn eval(input: &str, data: &(Vec<Row>, Vec<ColumnDef>)) -> String {
        evaluate(input, &data.0, &data.1).to_string()
    }

    #[test]
    fn test_sum_and_average() {
        let data = ten_twenty();
        assert_eq!(eval("=SUM(A1:A2)", &data), "30");
        assert_eq!(eval("=AVERAGE(A1:A2)", &data), "15");
        assert_eq!(eval("=sum(a1:a2)", &data), "30");
    }

    #[test]
    fn test_passthrough() {
        let data = ten_twenty();
        assert_eq!(evaluate("hello", &data.0, &data.1), FormulaResult::Passthrough("hello".into()));
    }

    #[test]
    fn test_reference_arithmetic() {
        let data = ten_twenty();
        assert_eq!(eval("=A1+A2", &data), "30");
        assert_eq!(eval("=(A1+A2)/4", &data), "7.5");
        assert_eq!(eval("=SUM(A1:A2)*2-A1", &data), "50");
    }

    #[test]
    fn test_unknown_range_column_is_error() {
        let data = ten_twenty();
        assert_eq!(eval("=SUM(Z1:Z2)", &data), ERROR_SENTINEL);
        assert_eq!(eval("=AVERAGE(Z1:Z2)", &data), ERROR_SENTINEL);
    }

    #[test]
    fn test_missing_reference_reads_zero() {
        let data = ten_twenty();
        assert_eq!(eval("=Z1+1", &data), "1");
        assert_eq!(eval("=A99+1", &data), "1");
        assert_eq!(eval("=B1+1", &data), "1");
    }

    #[test]
    fn test_average_skips_undefined() {
        // Row 2 has no entry under A
        let data = sheet(&[
            ("col_a", CellValue::Number(9.0)),
            ("col_b", CellValue::Number(1.0)),
            ("col_a", CellValue::Number(3.0)),
        ]);
        assert_eq!(eval("=AVERAGE(A1:A3)", &data), "6");
        assert_eq!(eval("=SUM(A1:A3)", &data), "12");
    }

    #[test]
    fn test_empty_average_is_zero() {
        let data = ten_twenty();
        assert_eq!(eval("=AVERAGE(B1:B2)", &data), "0");
        assert_eq!(eval("=AVERAGE(A5:A9)", &data), "0");
    }

    #[test]
    fn test_rectangular_and_reversed_ranges() {
        let data = sheet(&[("col_a", CellValue::Number(1.0)), ("col_b", CellValue::Number(2.0))]);
        assert_eq!(eval("=SUM(A1:B2)", &data), "3");
        assert_eq!(eval("=SUM(B2:A1)", &data), "3");
    }

    #[test]
    fn test_non_numeric_in_range_counts_zero() {
        let data = sheet(&[
            ("col_a", CellValue::Text("n/a".into())),
            ("col_a", CellValue::Number(4.0)),
        ]);
        assert_eq!(eval("=SUM(A1:A2)", &data), "4");
        assert_eq!(eval("=AVERAGE(A1:A2)", &data), "2");
    }

    #[test]
    fn test_text_reference_is_error() {
        let data = sheet(&[("col_a", CellValue::Text("hello".into()))]);
        assert_eq!(eval("=A1*2", &data), ERROR_SENTINEL);
    }

    #[test]
    fn test_malformed_and_unsafe_expressions() {
        let data = ten_twenty();
        assert_eq!(eval("=A1+", &data), ERROR_SENTINEL);
        assert_eq!(eval("=process.exit()", &data), ERROR_SENTINEL);
        assert_eq!(eval("=1/0", &data), ERROR_SENTINEL);
        assert_eq!(eval("=", &data), ERROR_SENTINEL);
    }

    #[test]
    fn test_negative_substitution() {
        let data = sheet(&[("col_a", CellValue::Number(-5.0)), ("col_a", CellValue::Number(3.0))]);
        assert_eq!(eval("=A2*A1", &data), "-15");
        assert_eq!(eval("=10-A1", &data), "15");
        assert_eq!(eval("=2*SUM(A1:A1)", &data), "-10");
    }

    #[test]
    fn test_nested_formula_cells() {
        let data = sheet(&[
            ("col_a", CellValue::Number(4.0)),
            ("col_a", CellValue::Text("=A1*2".into())),
        ]);
        assert_eq!(eval("=A2+1", &data), "9");
        assert_eq!(eval("=SUM(A1:A2)", &data), "12");
    }

    #[test]
    fn test_cycle_is_error() {
        let data = sheet(&[
            ("col_a", CellValue::Text("=A2".into())),
            ("col_a", CellValue::Text("=A1".into())),
        ]);
        assert_eq!(eval("=A1", &data), ERROR_SENTINEL);
    }

    #[test]
    fn test_checkbox_reference() {
        let data = sheet(&[("col_a", CellValue::Bool(true)), ("col_a", CellValue::Bool(false))]);
        assert_eq!(eval("=A1+A2", &data), "1");
        assert_eq!(eval("=SUM(A1:A2)", &data), "1");
    }

    fn chain(len: usize) -> (Vec<Row>, Vec<ColumnDef>) {
        let mut values = vec![("col_a", CellValue::Number(1.0))];
        let formulas: Vec<String> = (1..len).map(|i| format!("=A{}+1", i)).collect();
        values.extend(formulas.iter().map(|f| ("col_a", CellValue::Text(f.clone()))));
        sheet(&values)
    }

    #[test]
    fn test_formula_chain_within_limit() {
        let data = chain(200);
        assert_eq!(eval("=A200", &data), "200");
    }

    #[test]
    fn test_formula_chain_too_deep_is_error() {
        let data = chain(5000);
        assert_eq!(eval("=A5000", &data), ERROR_SENTINEL);
        // Shallow cells of the same sheet still evaluate
        assert_eq!(eval("=A10", &data), "10");
    }

    #[test]
    fn test_deep_parentheses_are_error() {
        let data = ten_twenty();
        let deep = format!("={}A1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(eval(&deep, &data), ERROR_SENTINEL);
    }

    #[test]
    fn test_huge_range_is_clamped_to_sheet() {
        let data = ten_twenty();
        assert_eq!(eval("=SUM(A1:A999999999999)", &data), "30");
        assert_eq!(eval("=AVERAGE(A999999999999:A1)", &data), "15");
        assert_eq!(eval("=SUM(A500000000:A999999999999)", &data), "0");
    }

    #[test]
    fn test_running_sums_share_work() {
        // Each row sums every row above it; without reuse this is exponential
        let mut values = vec![("col_a", CellValue::Number(1.0))];
        let formulas: Vec<String> = (1..40).map(|i| format!("=SUM(A1:A{})", i)).collect();
        values.extend(formulas.iter().map(|f| ("col_a", CellValue::Text(f.clone()))));
        let data = sheet(&values);
        assert_eq!(eval("=A40", &data), (1u64 << 38).to_string());
    }
}
