//! FILENAME: core/engine/src/table.rs
//! PURPOSE: The in-memory source table (header row + records).
//! CONTEXT: Every record is a dense vector aligned with the header. Loaders in
//! the persistence crate build tables; the rollup engine only reads them.

use crate::cell::CellValue;
use serde::{Deserialize, Serialize};

/// A flat table of records with named columns.
/// Row indices are 0-based and exclude the header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl DataTable {
    /// Creates an empty table with the given column names.
    pub fn new(headers: Vec<String>) -> Self {
        DataTable {
            headers,
            rows: Vec::new(),
        }
    }

    /// Builds a table from string headers and pre-built rows.
    pub fn from_rows(headers: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        let mut table = DataTable::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Appends a record. Short rows are padded with `Empty`, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.headers.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name. Duplicate headers resolve to the first match.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (row, col), or None when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Iterates over one column's values in row order.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().filter_map(move |r| r.get(col))
    }

    /// Returns a new table with the same header and only the rows for which
    /// `keep` returns true.
    pub fn retain_rows<F>(&self, mut keep: F) -> DataTable
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        DataTable {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_rows() {
        let mut table = DataTable::new(vec!["a".into(), "b".into()]);
        table.push_row(vec![CellValue::Number(1.0)]);
        assert_eq!(table.get(0, 1), Some(&CellValue::Empty));
    }

    #[test]
    fn duplicate_header_resolves_to_first() {
        let table = DataTable::from_rows(&["x", "y", "x"], vec![]);
        assert_eq!(table.column_index("x"), Some(0));
        assert_eq!(table.column_index("z"), None);
    }

    #[test]
    fn retain_keeps_header() {
        let table = DataTable::from_rows(
            &["n"],
            vec![vec![1.0.into()], vec![2.0.into()], vec![3.0.into()]],
        );
        let odd = table.retain_rows(|r| r[0] != CellValue::Number(2.0));
        assert_eq!(odd.row_count(), 2);
        assert_eq!(odd.headers(), table.headers());
    }

    #[test]
    fn serializes_to_json() {
        let table = DataTable::from_rows(&["a"], vec![vec!["v".into()]]);
        let json = serde_json::to_string(&table).unwrap();
        let back: DataTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
