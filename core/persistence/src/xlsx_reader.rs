//! FILENAME: core/persistence/src/xlsx_reader.rs

use crate::PersistenceError;
use calamine::{open_workbook_auto, Data, Reader};
use engine::{CellValue, DataTable};
use std::path::Path;

/// Loads one worksheet as a table. The first row is the header.
/// `sheet = None` reads the first sheet. Fully empty rows are skipped.
pub fn load_xlsx(path: &Path, sheet: Option<&str>) -> Result<DataTable, PersistenceError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_vec();

    if sheet_names.is_empty() {
        return Err(PersistenceError::InvalidFormat(
            "Workbook contains no sheets".to_string(),
        ));
    }

    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| PersistenceError::SheetNotFound(name.to_string()))?,
        None => sheet_names[0].clone(),
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .map(|(col_idx, cell)| match cell {
                Data::Empty => format!("Unnamed: {}", col_idx),
                Data::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        None => {
            return Err(PersistenceError::InvalidFormat(format!(
                "Sheet '{}' has no header row",
                sheet_name
            )))
        }
    };

    let mut table = DataTable::new(headers);

    for (row_idx, row) in rows.enumerate() {
        let values: Vec<CellValue> = row
            .iter()
            .map(|cell| match cell {
                Data::Empty => CellValue::Empty,
                Data::String(s) if s.is_empty() => CellValue::Empty,
                Data::String(s) => CellValue::Text(s.clone()),
                Data::Float(f) => CellValue::Number(*f),
                Data::Int(i) => CellValue::Number(*i as f64),
                Data::Bool(b) => CellValue::Boolean(*b),
                Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
                Data::DateTimeIso(s) => CellValue::Text(s.clone()),
                Data::DurationIso(s) => CellValue::Text(s.clone()),
                Data::Error(e) => {
                    log::warn!(
                        target: "persistence",
                        "sheet '{}' row {}: error cell {:?} read as empty",
                        sheet_name,
                        row_idx + 1,
                        e
                    );
                    CellValue::Empty
                }
            })
            .collect();

        if values.iter().all(|v| v.is_empty()) {
            continue;
        }
        table.push_row(values);
    }

    log::info!(
        target: "persistence",
        "loaded sheet '{}' from {:?}: {} columns, {} rows",
        sheet_name,
        path,
        table.column_count(),
        table.row_count()
    );

    Ok(table)
}
