use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Declared type of a column, or a per-cell override of it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    #[default]
    Text,
    Number,
    Currency,
    Date,
    Checkbox,
    Url,
    Priority,
    Status,
}

impl CellType {
    pub const ALL: [CellType; 8] = [
        CellType::Text,
        CellType::Number,
        CellType::Currency,
        CellType::Date,
        CellType::Checkbox,
        CellType::Url,
        CellType::Priority,
        CellType::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Text => "text",
            CellType::Number => "number",
            CellType::Currency => "currency",
            CellType::Date => "date",
            CellType::Checkbox => "checkbox",
            CellType::Url => "url",
            CellType::Priority => "priority",
            CellType::Status => "status",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// The value a freshly created cell of this type holds.
    ///
    /// Used by row insertion, column insertion, column type changes and
    /// per-cell type changes alike, so every path agrees on the table.
    pub fn default_value(&self, today: NaiveDate) -> CellValue {
        match self {
            CellType::Checkbox => CellValue::Bool(false),
            CellType::Number | CellType::Currency => CellValue::Number(0.0),
            CellType::Priority => CellValue::Text("low".to_string()),
            CellType::Status => CellValue::Text("todo".to_string()),
            CellType::Date => CellValue::Text(today.format("%Y-%m-%d").to_string()),
            CellType::Text | CellType::Url => CellValue::Text(String::new()),
        }
    }

    /// Coerce raw user input into a value for a cell of this type.
    ///
    /// Formulas and anything that fails to parse are kept as text, so a
    /// number column can still hold `=A1+1`.
    pub fn coerce_input(&self, input: &str) -> CellValue {
        let trimmed = input.trim();
        if trimmed.starts_with('=') {
            return CellValue::Text(trimmed.to_string());
        }
        match self {
            CellType::Number | CellType::Currency => match trimmed.parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(input.to_string()),
            },
            CellType::Checkbox => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "x" => CellValue::Bool(true),
                "false" | "no" | "0" | "" => CellValue::Bool(false),
                _ => CellValue::Text(input.to_string()),
            },
            _ => CellValue::Text(input.to_string()),
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored cell value. An absent entry in a row is the "undefined" cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl CellValue {
    /// Numeric view used by range aggregation. Text that does not parse counts as 0,
    /// checkboxes as 1/0.
    pub fn as_number(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse().unwrap_or(0.0),
            CellValue::Bool(b) => if *b { 1.0 } else { 0.0 },
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            _ => None,
        }
    }
}

pub const DEFAULT_FONT_SIZE: f32 = 12.0;
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const DEFAULT_BG_COLOR: &str = "#ffffff";

/// Fully resolved cell formatting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub font_size: f32,
    pub text_color: String,
    pub bg_color: String,
    pub align: Alignment,
}

impl Default for CellFormat {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            font_size: DEFAULT_FONT_SIZE,
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            bg_color: DEFAULT_BG_COLOR.to_string(),
            align: Alignment::Left,
        }
    }
}

/// Sparse format override. `None` fields inherit the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormatPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
}

impl FormatPatch {
    pub fn bold(value: bool) -> Self {
        Self { bold: Some(value), ..Self::default() }
    }

    pub fn italic(value: bool) -> Self {
        Self { italic: Some(value), ..Self::default() }
    }

    pub fn underline(value: bool) -> Self {
        Self { underline: Some(value), ..Self::default() }
    }

    pub fn strikethrough(value: bool) -> Self {
        Self { strikethrough: Some(value), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow merge: fields set in `other` win.
    pub fn merged(&self, other: &FormatPatch) -> FormatPatch {
        FormatPatch {
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            strikethrough: other.strikethrough.or(self.strikethrough),
            font_size: other.font_size.or(self.font_size),
            text_color: other.text_color.clone().or_else(|| self.text_color.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            align: other.align.or(self.align),
        }
    }

    pub fn resolve(&self, base_font_size: f32) -> CellFormat {
        CellFormat {
            bold: self.bold.unwrap_or(false),
            italic: self.italic.unwrap_or(false),
            underline: self.underline.unwrap_or(false),
            strikethrough: self.strikethrough.unwrap_or(false),
            font_size: self.font_size.unwrap_or(base_font_size),
            text_color: self.text_color.clone().unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
            bg_color: self.bg_color.clone().unwrap_or_else(|| DEFAULT_BG_COLOR.to_string()),
            align: self.align.unwrap_or_default(),
        }
    }
}

/// Render-ready style descriptor for one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellStyle {
    pub font_weight: &'static str,
    pub font_style: &'static str,
    pub text_decoration: String,
    pub font_size: String,
    pub color: String,
    pub background_color: String,
    pub text_align: &'static str,
    pub white_space: &'static str,
    pub overflow: &'static str,
    pub text_overflow: &'static str,
}

impl CellStyle {
    pub fn from_format(format: &CellFormat, wrap: bool) -> Self {
        let mut decorations = Vec::new();
        if format.underline {
            decorations.push("underline");
        }
        if format.strikethrough {
            decorations.push("line-through");
        }
        let text_decoration = if decorations.is_empty() {
            "none".to_string()
        } else {
            decorations.join(" ")
        };

        Self {
            font_weight: if format.bold { "bold" } else { "normal" },
            font_style: if format.italic { "italic" } else { "normal" },
            text_decoration,
            font_size: format!("{}px", format.font_size),
            color: format.text_color.clone(),
            background_color: format.bg_color.clone(),
            text_align: format.align.as_str(),
            white_space: if wrap { "pre-wrap" } else { "nowrap" },
            overflow: if wrap { "visible" } else { "hidden" },
            text_overflow: if wrap { "clip" } else { "ellipsis" },
        }
    }
}
