//! FILENAME: core/rollup-engine/src/filter.rs
//! Record filters applied before a rollup or breakdown.
//!
//! Every filter names a column and a condition; a record is kept only when it
//! passes all filters.

use engine::{CellValue, DataTable};
use serde::{Deserialize, Serialize};

use crate::cache::resolve_column;
use crate::error::RollupResult;

/// A filter on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub column: String,
    pub condition: FilterCondition,
}

/// Types of filter conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterCondition {
    /// Include only these specific values.
    ValueList(Vec<FilterValue>),

    /// Include numeric values inside an inclusive range. Open ends are unbounded.
    NumberRange { min: Option<f64>, max: Option<f64> },
}

/// A value that can be filtered on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl FilterValue {
    pub fn matches(&self, cell: &CellValue) -> bool {
        match (self, cell) {
            (FilterValue::Empty, CellValue::Empty) => true,
            (FilterValue::Text(a), CellValue::Text(b)) => a == b,
            (FilterValue::Number(a), CellValue::Number(b)) => a == b,
            (FilterValue::Boolean(a), CellValue::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&CellValue> for FilterValue {
    fn from(cell: &CellValue) -> Self {
        match cell {
            CellValue::Empty => FilterValue::Empty,
            CellValue::Text(s) => FilterValue::Text(s.clone()),
            CellValue::Number(n) => FilterValue::Number(*n),
            CellValue::Boolean(b) => FilterValue::Boolean(*b),
        }
    }
}

impl FilterCondition {
    pub fn matches(&self, cell: &CellValue) -> bool {
        match self {
            FilterCondition::ValueList(values) => values.iter().any(|v| v.matches(cell)),
            FilterCondition::NumberRange { min, max } => match cell {
                CellValue::Number(n) => {
                    min.map_or(true, |lo| *n >= lo) && max.map_or(true, |hi| *n <= hi)
                }
                _ => false,
            },
        }
    }
}

impl RecordFilter {
    pub fn values(column: &str, values: Vec<FilterValue>) -> Self {
        RecordFilter {
            column: column.to_string(),
            condition: FilterCondition::ValueList(values),
        }
    }

    pub fn range(column: &str, min: Option<f64>, max: Option<f64>) -> Self {
        RecordFilter {
            column: column.to_string(),
            condition: FilterCondition::NumberRange { min, max },
        }
    }
}

/// Returns the records that pass every filter (AND semantics).
/// Fails with `MissingColumn` if a filter names an unknown column.
pub fn apply_filters(table: &DataTable, filters: &[RecordFilter]) -> RollupResult<DataTable> {
    let resolved = filters
        .iter()
        .map(|f| resolve_column(table, &f.column).map(|col| (col, &f.condition)))
        .collect::<RollupResult<Vec<_>>>()?;

    let filtered = table.retain_rows(|row| {
        resolved
            .iter()
            .all(|(col, condition)| row.get(*col).map_or(false, |cell| condition.matches(cell)))
    });

    log::debug!(
        target: "filter",
        "{} filters kept {} of {} records",
        filters.len(),
        filtered.row_count(),
        table.row_count()
    );

    Ok(filtered)
}
