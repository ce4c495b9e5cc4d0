//! FILENAME: core/persistence/src/xlsx_writer.rs

use crate::PersistenceError;
use rollup_engine::{Breakdown, TreeTable};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};
use std::path::Path;

pub const TREE_SHEET_NAME: &str = "tree";
pub const BREAKDOWN_SHEET_NAME: &str = "breakdown";

/// Writes the tree table to a single `tree` worksheet.
/// Undefined (NaN) colors and the root's empty parent are left blank.
pub fn save_tree_xlsx(tree: &TreeTable, path: &Path) -> Result<(), PersistenceError> {
    let mut xlsx = XlsxWorkbook::new();
    let worksheet = xlsx.add_worksheet();
    worksheet.set_name(TREE_SHEET_NAME)?;
    write_header(worksheet, &["id", "parent", "value", "color"])?;

    for (i, node) in tree.nodes().iter().enumerate() {
        let row = (i + 1) as u32;
        write_text(worksheet, row, 0, &node.id)?;
        write_text(worksheet, row, 1, &node.parent)?;
        write_finite(worksheet, row, 2, node.value)?;
        write_finite(worksheet, row, 3, node.color)?;
    }

    xlsx.save(path)?;
    Ok(())
}

/// Writes a breakdown as one row per (category, series) pair.
pub fn save_breakdown_xlsx(breakdown: &Breakdown, path: &Path) -> Result<(), PersistenceError> {
    let mut xlsx = XlsxWorkbook::new();
    let worksheet = xlsx.add_worksheet();
    worksheet.set_name(BREAKDOWN_SHEET_NAME)?;
    write_header(worksheet, &["category", "series", "measure", "percent"])?;

    for (i, cell) in breakdown.cells.iter().enumerate() {
        let row = (i + 1) as u32;
        write_text(worksheet, row, 0, &cell.category)?;
        write_text(worksheet, row, 1, &cell.series)?;
        write_finite(worksheet, row, 2, cell.measure)?;
        write_finite(worksheet, row, 3, cell.percent)?;
    }

    xlsx.save(path)?;
    Ok(())
}

fn write_header(worksheet: &mut Worksheet, names: &[&str]) -> Result<(), PersistenceError> {
    let bold = Format::new().set_bold();
    for (col, name) in names.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &bold)?;
    }
    Ok(())
}

fn write_text(worksheet: &mut Worksheet, row: u32, col: u16, text: &str) -> Result<(), PersistenceError> {
    if !text.is_empty() {
        worksheet.write_string(row, col, text)?;
    }
    Ok(())
}

fn write_finite(worksheet: &mut Worksheet, row: u32, col: u16, n: f64) -> Result<(), PersistenceError> {
    if n.is_finite() {
        worksheet.write_number(row, col, n)?;
    }
    Ok(())
}
