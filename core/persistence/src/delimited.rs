//! FILENAME: core/persistence/src/delimited.rs
//! Delimited text input and the CSV forms of tree tables and breakdowns.

use crate::PersistenceError;
use engine::{CellValue, DataTable};
use rollup_engine::{Breakdown, TreeTable};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Loads a delimited text file. The first record is the header.
pub fn load_csv(path: &Path, delimiter: u8) -> Result<DataTable, PersistenceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.is_empty() {
        return Err(PersistenceError::InvalidFormat(format!(
            "{:?} has no header row",
            path
        )));
    }

    let mut table = DataTable::new(headers);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(parse_field).collect());
    }

    log::info!(
        target: "persistence",
        "loaded {:?}: {} columns, {} rows",
        path,
        table.column_count(),
        table.row_count()
    );

    Ok(table)
}

/// Types one text field: empty, number, boolean, or text.
pub fn parse_field(field: &str) -> CellValue {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        if n.is_finite() {
            return CellValue::Number(n);
        }
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Boolean(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Boolean(false);
    }
    CellValue::Text(trimmed.to_string())
}

/// Formats a number for text output. Non-finite values become an empty field.
pub fn format_number(n: f64) -> String {
    if n.is_finite() {
        n.to_string()
    } else {
        String::new()
    }
}

/// Writes `id,parent,value,color` rows.
pub fn write_tree_csv<W: Write>(tree: &TreeTable, writer: W) -> Result<(), PersistenceError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["id", "parent", "value", "color"])?;
    for node in tree.nodes() {
        let value = format_number(node.value);
        let color = format_number(node.color);
        wtr.write_record([node.id.as_str(), node.parent.as_str(), value.as_str(), color.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_tree_csv(tree: &TreeTable, path: &Path) -> Result<(), PersistenceError> {
    write_tree_csv(tree, File::create(path)?)
}

/// Writes `category,series,measure,percent` rows.
pub fn write_breakdown_csv<W: Write>(breakdown: &Breakdown, writer: W) -> Result<(), PersistenceError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["category", "series", "measure", "percent"])?;
    for cell in &breakdown.cells {
        let measure = format_number(cell.measure);
        let percent = format_number(cell.percent);
        wtr.write_record([
            cell.category.as_str(),
            cell.series.as_str(),
            measure.as_str(),
            percent.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_breakdown_csv(breakdown: &Breakdown, path: &Path) -> Result<(), PersistenceError> {
    write_breakdown_csv(breakdown, File::create(path)?)
}
