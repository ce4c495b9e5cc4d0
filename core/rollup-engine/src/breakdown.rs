//! FILENAME: core/rollup-engine/src/breakdown.rs
//! Stacked-bar breakdown: category x series measures with within-category percentages.

use engine::DataTable;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cache::{
    numeric_cell, resolve_column, CacheValue, FieldCache, ValueId, EMPTY_CELL, VALUE_ID_EMPTY,
};
use crate::definition::{BreakdownDefinition, NullKeyPolicy};
use crate::error::{RollupError, RollupResult};

/// One stacked segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownCell {
    pub category: String,
    pub series: String,
    /// Record count or summed value.
    pub measure: f64,
    /// Share of the category total, 0-100. NaN when the category total is zero.
    pub percent: f64,
}

/// The full breakdown, categories and series in sorted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub categories: Vec<String>,
    pub series: Vec<String>,
    /// Totals per category, aligned with `categories`.
    pub totals: Vec<f64>,
    /// Only the (category, series) pairs that occur in the data.
    pub cells: Vec<BreakdownCell>,
}

impl Breakdown {
    pub fn category_total(&self, category: &str) -> Option<f64> {
        self.categories
            .iter()
            .position(|c| c == category)
            .map(|i| self.totals[i])
    }

    pub fn cell(&self, category: &str, series: &str) -> Option<&BreakdownCell> {
        self.cells
            .iter()
            .find(|c| c.category == category && c.series == series)
    }

    pub fn percent(&self, category: &str, series: &str) -> Option<f64> {
        self.cell(category, series).map(|c| c.percent)
    }
}

/// Groups records by (category, series) and computes each series' share of its category.
pub fn build_breakdown(table: &DataTable, definition: &BreakdownDefinition) -> RollupResult<Breakdown> {
    let category_col = resolve_column(table, &definition.category)?;
    let series_col = resolve_column(table, &definition.series)?;
    let value_col = definition
        .value_column
        .as_deref()
        .map(|name| resolve_column(table, name).map(|col| (col, name)))
        .transpose()?;

    if table.is_empty() {
        return Err(RollupError::EmptyInput);
    }

    let mut categories = FieldCache::new(definition.category.clone());
    let mut series = FieldCache::new(definition.series.clone());
    let mut measures: FxHashMap<(ValueId, ValueId), f64> = FxHashMap::default();

    for (row_idx, row) in table.rows().iter().enumerate() {
        let key_of = |field: &mut FieldCache, col: usize| -> RollupResult<ValueId> {
            let cell = row.get(col).unwrap_or(&EMPTY_CELL);
            if cell.is_empty() && definition.null_keys == NullKeyPolicy::Reject {
                return Err(RollupError::NullGroupKey {
                    column: field.name.clone(),
                    row: row_idx,
                });
            }
            Ok(field.intern(CacheValue::from(cell)))
        };
        let category_id = key_of(&mut categories, category_col)?;
        let series_id = key_of(&mut series, series_col)?;

        let measure = match value_col {
            Some((col, name)) => numeric_cell(row, col, name, row_idx)?,
            None => 1.0,
        };
        *measures.entry((category_id, series_id)).or_insert(0.0) += measure;
    }

    categories.ensure_unique_labels(definition.null_keys.label())?;
    series.ensure_unique_labels(definition.null_keys.label())?;

    let null_label = definition.null_keys.label().unwrap_or_default();
    let label = |field: &FieldCache, id: ValueId| -> String {
        if id == VALUE_ID_EMPTY {
            null_label.to_string()
        } else {
            field.get_value(id).map(|v| v.display_value()).unwrap_or_default()
        }
    };

    let category_ids = with_empty(&mut categories, &measures, |k| k.0);
    let series_ids = with_empty(&mut series, &measures, |k| k.1);

    let mut breakdown = Breakdown {
        categories: category_ids.iter().map(|&id| label(&categories, id)).collect(),
        series: series_ids.iter().map(|&id| label(&series, id)).collect(),
        totals: Vec::with_capacity(category_ids.len()),
        cells: Vec::with_capacity(measures.len()),
    };

    for (cat_pos, &cat_id) in category_ids.iter().enumerate() {
        let total: f64 = series_ids
            .iter()
            .filter_map(|&s| measures.get(&(cat_id, s)))
            .sum();
        breakdown.totals.push(total);

        for (ser_pos, &ser_id) in series_ids.iter().enumerate() {
            if let Some(&measure) = measures.get(&(cat_id, ser_id)) {
                let percent = if total == 0.0 { f64::NAN } else { 100.0 * measure / total };
                breakdown.cells.push(BreakdownCell {
                    category: breakdown.categories[cat_pos].clone(),
                    series: breakdown.series[ser_pos].clone(),
                    measure,
                    percent,
                });
            }
        }
    }

    log::info!(
        target: "breakdown",
        "breakdown {} x {}: {} categories, {} series",
        definition.category,
        definition.series,
        breakdown.categories.len(),
        breakdown.series.len()
    );

    Ok(breakdown)
}

/// Sorted ids of a field, with the empty id first when it occurs in the data.
fn with_empty<F>(field: &mut FieldCache, measures: &FxHashMap<(ValueId, ValueId), f64>, pick: F) -> Vec<ValueId>
where
    F: Fn(&(ValueId, ValueId)) -> ValueId,
{
    let mut ids = Vec::with_capacity(field.unique_count() + 1);
    if measures.keys().any(|k| pick(k) == VALUE_ID_EMPTY) {
        ids.push(VALUE_ID_EMPTY);
    }
    ids.extend_from_slice(field.sorted_ids());
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::CellValue;

    fn table() -> DataTable {
        let rows = [
            ("Bachelor", "Yes", 2.0),
            ("Bachelor", "No", 1.0),
            ("Bachelor", "Yes", 3.0),
            ("Master", "No", 4.0),
            ("PhD", "Yes", 0.0),
        ];
        DataTable::from_rows(
            &["Degree", "Entrepreneur", "Offers"],
            rows.iter()
                .map(|(d, e, o)| vec![(*d).into(), (*e).into(), (*o).into()])
                .collect(),
        )
    }

    #[test]
    fn test_counting_percentages() {
        let b = build_breakdown(&table(), &BreakdownDefinition::counting("Degree", "Entrepreneur")).unwrap();

        assert_eq!(b.categories, vec!["Bachelor", "Master", "PhD"]);
        assert_eq!(b.series, vec!["No", "Yes"]);
        assert_eq!(b.category_total("Bachelor"), Some(3.0));
        let yes = b.percent("Bachelor", "Yes").unwrap();
        assert!((yes - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(b.percent("Master", "No"), Some(100.0));
        assert_eq!(b.cell("Master", "Yes"), None);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let b = build_breakdown(&table(), &BreakdownDefinition::counting("Degree", "Entrepreneur")).unwrap();
        for category in &b.categories {
            let sum: f64 = b.cells.iter().filter(|c| &c.category == category).map(|c| c.percent).sum();
            assert!((sum - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_summing_with_zero_total() {
        let b = build_breakdown(&table(), &BreakdownDefinition::summing("Degree", "Entrepreneur", "Offers")).unwrap();
        assert_eq!(b.category_total("Bachelor"), Some(6.0));
        assert_eq!(b.cell("Bachelor", "Yes").map(|c| c.measure), Some(5.0));
        assert!(b.percent("PhD", "Yes").unwrap().is_nan());
    }

    #[test]
    fn test_blank_category() {
        let mut t = table();
        t.push_row(vec![CellValue::Empty, "No".into(), 1.0.into()]);

        let reject = BreakdownDefinition::counting("Degree", "Entrepreneur");
        assert!(matches!(
            build_breakdown(&t, &reject),
            Err(RollupError::NullGroupKey { row: 5, .. })
        ));

        let keep = BreakdownDefinition {
            null_keys: NullKeyPolicy::category(),
            ..reject
        };
        let b = build_breakdown(&t, &keep).unwrap();
        assert_eq!(b.categories[0], "(blank)");
        assert_eq!(b.percent("(blank)", "No"), Some(100.0));
    }

    #[test]
    fn test_short_rows_read_as_blank() {
        let t: DataTable = serde_json::from_str(r#"{"headers":["C","S"],"rows":[["Empty"]]}"#).unwrap();

        let reject = BreakdownDefinition::counting("C", "S");
        assert_eq!(
            build_breakdown(&t, &reject).unwrap_err(),
            RollupError::NullGroupKey { column: "C".to_string(), row: 0 }
        );

        let keep = BreakdownDefinition {
            null_keys: NullKeyPolicy::category(),
            ..reject
        };
        let b = build_breakdown(&t, &keep).unwrap();
        assert_eq!(b.series, vec!["(blank)"]);
        assert_eq!(b.percent("(blank)", "(blank)"), Some(100.0));
    }

    #[test]
    fn test_series_labels_must_differ() {
        let mut t = table();
        t.push_row(vec!["PhD".into(), true.into(), 1.0.into()]);
        t.push_row(vec!["PhD".into(), "TRUE".into(), 1.0.into()]);

        let err = build_breakdown(&t, &BreakdownDefinition::counting("Degree", "Entrepreneur")).unwrap_err();
        assert!(matches!(err, RollupError::AmbiguousLabel { ref column, .. } if column == "Entrepreneur"));
    }

    #[test]
    fn test_missing_series_column() {
        let err = build_breakdown(&table(), &BreakdownDefinition::counting("Degree", "Field")).unwrap_err();
        assert_eq!(err, RollupError::MissingColumn("Field".to_string()));
    }
}
