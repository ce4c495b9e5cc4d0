//! FILENAME: core/engine/src/cell.rs
//! PURPOSE: Defines the value held by a single cell of a source table.
//! CONTEXT: Source tables come from spreadsheets and delimited text, so a cell
//! is either empty, a number, a piece of text, or a boolean.

use serde::{Deserialize, Serialize};

/// Represents the raw data within a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl CellValue {
    pub fn text(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric view of the cell used when summing a column.
    /// Booleans count as 1/0 and empty cells as 0. Text has no numeric view.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Empty => Some(0.0),
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Text(_) => None,
        }
    }

    /// Returns the display value of the cell as a String.
    /// This is the label a category gets when it becomes a tree node.
    pub fn display_value(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => {
                if *b { "TRUE" } else { "FALSE" }.to_string()
            }
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}
