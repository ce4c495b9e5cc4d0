//! FILENAME: core/persistence/src/lib.rs
//! Drilldown Persistence Module
//!
//! Loads source tables from XLSX or delimited text and saves tree tables and
//! breakdowns as CSV, XLSX or JSON.

mod delimited;
mod error;
mod xlsx_reader;
mod xlsx_writer;

pub use delimited::{
    format_number, load_csv, parse_field, save_breakdown_csv, save_tree_csv,
    write_breakdown_csv, write_tree_csv,
};
pub use error::PersistenceError;
pub use xlsx_reader::load_xlsx;
pub use xlsx_writer::{save_breakdown_xlsx, save_tree_xlsx, BREAKDOWN_SHEET_NAME, TREE_SHEET_NAME};

use engine::DataTable;
use rollup_engine::{Breakdown, SunburstPayload, TreeTable};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// INPUT
// ============================================================================

/// Spreadsheet extensions read through calamine; anything else is delimited text.
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

pub fn is_spreadsheet(path: &Path) -> bool {
    SPREADSHEET_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Loads a source table, picking the reader from the file extension.
/// `sheet` only applies to spreadsheets; `.tsv` files are tab-delimited.
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<DataTable, PersistenceError> {
    if is_spreadsheet(path) {
        load_xlsx(path, sheet)
    } else if extension_of(path) == "tsv" {
        load_csv(path, b'\t')
    } else {
        load_csv(path, b',')
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// File formats for rollup output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Xlsx,
    Json,
}

impl OutputFormat {
    /// Guesses the format from an output path, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match extension_of(path).as_str() {
            "xlsx" => OutputFormat::Xlsx,
            "json" => OutputFormat::Json,
            _ => OutputFormat::Csv,
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Csv
    }
}

impl FromStr for OutputFormat {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" => Ok(OutputFormat::Xlsx),
            "json" => Ok(OutputFormat::Json),
            other => Err(PersistenceError::InvalidFormat(format!(
                "unknown output format '{}'",
                other
            ))),
        }
    }
}

/// Writes the sunburst payload of a tree as pretty JSON.
pub fn write_tree_json<W: Write>(tree: &TreeTable, writer: W) -> Result<(), PersistenceError> {
    let payload = SunburstPayload::from_tree(tree);
    serde_json::to_writer_pretty(writer, &payload)?;
    Ok(())
}

pub fn write_breakdown_json<W: Write>(breakdown: &Breakdown, writer: W) -> Result<(), PersistenceError> {
    serde_json::to_writer_pretty(writer, breakdown)?;
    Ok(())
}

pub fn save_tree(tree: &TreeTable, path: &Path, format: OutputFormat) -> Result<(), PersistenceError> {
    match format {
        OutputFormat::Csv => save_tree_csv(tree, path)?,
        OutputFormat::Xlsx => save_tree_xlsx(tree, path)?,
        OutputFormat::Json => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_tree_json(tree, &mut writer)?;
            writer.flush()?;
        }
    }
    log::info!(target: "persistence", "saved {} tree nodes to {:?} ({:?})", tree.len(), path, format);
    Ok(())
}

pub fn save_breakdown(breakdown: &Breakdown, path: &Path, format: OutputFormat) -> Result<(), PersistenceError> {
    match format {
        OutputFormat::Csv => save_breakdown_csv(breakdown, path)?,
        OutputFormat::Xlsx => save_breakdown_xlsx(breakdown, path)?,
        OutputFormat::Json => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_breakdown_json(breakdown, &mut writer)?;
            writer.flush()?;
        }
    }
    log::info!(
        target: "persistence",
        "saved {} breakdown cells to {:?} ({:?})",
        breakdown.cells.len(),
        path,
        format
    );
    Ok(())
}

/// Writes a tree to any writer (stdout) in a text format.
pub fn write_tree(tree: &TreeTable, writer: impl Write, format: OutputFormat) -> Result<(), PersistenceError> {
    match format {
        OutputFormat::Csv => write_tree_csv(tree, writer),
        OutputFormat::Json => write_tree_json(tree, writer),
        OutputFormat::Xlsx => Err(PersistenceError::InvalidFormat(
            "xlsx output needs an output file".to_string(),
        )),
    }
}

pub fn write_breakdown(breakdown: &Breakdown, writer: impl Write, format: OutputFormat) -> Result<(), PersistenceError> {
    match format {
        OutputFormat::Csv => write_breakdown_csv(breakdown, writer),
        OutputFormat::Json => write_breakdown_json(breakdown, writer),
        OutputFormat::Xlsx => Err(PersistenceError::InvalidFormat(
            "xlsx output needs an output file".to_string(),
        )),
    }
}
