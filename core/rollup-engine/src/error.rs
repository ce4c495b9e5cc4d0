//! FILENAME: core/rollup-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RollupError {
    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Input table has no records")]
    EmptyInput,

    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("Non-numeric value in column '{column}' at row {row}")]
    NonNumericValue { column: String, row: usize },

    #[error("Empty group key in column '{column}' at row {row}")]
    NullGroupKey { column: String, row: usize },

    #[error("Different values in column '{column}' share the label '{label}'")]
    AmbiguousLabel { column: String, label: String },
}

pub type RollupResult<T> = Result<T, RollupError>;
