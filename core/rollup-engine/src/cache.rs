//! FILENAME: core/rollup-engine/src/cache.rs
//! Rollup Cache - Interned internal representation.
//!
//! The cache is designed for:
//! - A single validating pass over the source table (O(n) where n = rows)
//! - Cheap composite keys: each level value is interned once per column and
//!   referenced by id, so a group key is a short vector of integers
//! - Re-grouping at every level without re-reading the table
//!
//! Architecture:
//! - Each unique value is stored once and referenced by index
//! - Records keep the interned ids of their level values plus the three
//!   numeric inputs (value, numerator, denominator)

use std::cmp::Ordering;

use engine::{CellValue, DataTable};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::{HierarchyDefinition, NullKeyPolicy};
use crate::error::{RollupError, RollupResult};

// ============================================================================
// VALUE INTERNING
// ============================================================================

/// A reference to an interned value within a field's unique value store.
pub type ValueId = u32;

/// Represents an empty cell in the cache.
pub const VALUE_ID_EMPTY: ValueId = u32::MAX;

pub(crate) static EMPTY_CELL: CellValue = CellValue::Empty;

/// A normalized, hashable representation of a cell value.
/// Used as keys in the unique value store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheValue {
    Empty,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
}

impl From<&CellValue> for CacheValue {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => CacheValue::Empty,
            CellValue::Number(n) => CacheValue::Number(OrderedFloat(*n)),
            CellValue::Text(s) => CacheValue::Text(s.clone()),
            CellValue::Boolean(b) => CacheValue::Boolean(*b),
        }
    }
}

impl CacheValue {
    pub fn to_cell_value(&self) -> CellValue {
        match self {
            CacheValue::Empty => CellValue::Empty,
            CacheValue::Number(n) => CellValue::Number(n.0),
            CacheValue::Text(s) => CellValue::Text(s.clone()),
            CacheValue::Boolean(b) => CellValue::Boolean(*b),
        }
    }

    /// Label shown for this value when it becomes a node or a bar.
    pub fn display_value(&self) -> String {
        self.to_cell_value().display_value()
    }
}

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // 0.0 and -0.0 compare equal, so they must hash equal
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

/// Sort order for cache values: empty, numbers, text, booleans.
pub fn compare_cache_values(a: &CacheValue, b: &CacheValue) -> Ordering {
    match (a, b) {
        (CacheValue::Empty, CacheValue::Empty) => Ordering::Equal,
        (CacheValue::Empty, _) => Ordering::Less,
        (_, CacheValue::Empty) => Ordering::Greater,

        (CacheValue::Number(na), CacheValue::Number(nb)) => {
            na.0.partial_cmp(&nb.0).unwrap_or(Ordering::Equal)
        }
        (CacheValue::Number(_), _) => Ordering::Less,
        (_, CacheValue::Number(_)) => Ordering::Greater,

        (CacheValue::Text(ta), CacheValue::Text(tb)) => ta.cmp(tb),
        (CacheValue::Text(_), _) => Ordering::Less,
        (_, CacheValue::Text(_)) => Ordering::Greater,

        (CacheValue::Boolean(ba), CacheValue::Boolean(bb)) => ba.cmp(bb),
    }
}

// ============================================================================
// FIELD CACHE
// ============================================================================

/// Cache for a single column used as a grouping level.
/// Stores unique values and provides O(1) lookup by ValueId.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldCache {
    /// Column name (from the header row).
    pub name: String,

    /// Map from value to its unique ID (for deduplication during build).
    value_to_id: FxHashMap<CacheValue, ValueId>,

    /// Ordered list of unique values (indexed by ValueId).
    id_to_value: Vec<CacheValue>,

    /// Pre-sorted order of ValueIds (ascending by value).
    sorted_ids_asc: Vec<ValueId>,

    /// Whether the sorted indices need rebuilding.
    sort_dirty: bool,

    /// Whether an empty cell was interned.
    has_empty: bool,
}

impl FieldCache {
    pub fn new(name: String) -> Self {
        FieldCache {
            name,
            value_to_id: FxHashMap::default(),
            id_to_value: Vec::new(),
            sorted_ids_asc: Vec::new(),
            sort_dirty: true,
            has_empty: false,
        }
    }

    /// Interns a value and returns its ValueId.
    /// If the value already exists, returns the existing ID.
    pub fn intern(&mut self, value: CacheValue) -> ValueId {
        if let CacheValue::Empty = value {
            self.has_empty = true;
            return VALUE_ID_EMPTY;
        }

        if let Some(&id) = self.value_to_id.get(&value) {
            return id;
        }

        let id = self.id_to_value.len() as ValueId;
        self.id_to_value.push(value.clone());
        self.value_to_id.insert(value, id);
        self.sort_dirty = true;
        id
    }

    /// Gets the value for a given ID.
    pub fn get_value(&self, id: ValueId) -> Option<&CacheValue> {
        if id == VALUE_ID_EMPTY {
            return Some(&CacheValue::Empty);
        }
        self.id_to_value.get(id as usize)
    }

    /// Returns the number of unique values (excluding empty).
    pub fn unique_count(&self) -> usize {
        self.id_to_value.len()
    }

    pub fn has_empty(&self) -> bool {
        self.has_empty
    }

    /// Fails with `AmbiguousLabel` when two interned values (or the empty
    /// key's label) display the same way, since nodes are named by label.
    pub fn ensure_unique_labels(&self, null_label: Option<&str>) -> RollupResult<()> {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let empty_label = null_label.filter(|_| self.has_empty).map(|l| l.to_string());
        let labels = empty_label
            .into_iter()
            .chain(self.id_to_value.iter().map(|v| v.display_value()));
        for label in labels {
            if !seen.insert(label.clone()) {
                return Err(RollupError::AmbiguousLabel {
                    column: self.name.clone(),
                    label,
                });
            }
        }
        Ok(())
    }

    /// Returns all unique ValueIds in sorted order.
    pub fn sorted_ids(&mut self) -> &[ValueId] {
        if self.sort_dirty {
            self.rebuild_sort_order();
        }
        &self.sorted_ids_asc
    }

    fn rebuild_sort_order(&mut self) {
        self.sorted_ids_asc = (0..self.id_to_value.len() as ValueId).collect();
        let values = &self.id_to_value;
        self.sorted_ids_asc
            .sort_by(|&a, &b| compare_cache_values(&values[a as usize], &values[b as usize]));
        self.sort_dirty = false;
    }

    /// Compares two interned ids by their underlying values.
    pub fn compare_ids(&self, a: ValueId, b: ValueId) -> Ordering {
        match (self.get_value(a), self.get_value(b)) {
            (Some(va), Some(vb)) => compare_cache_values(va, vb),
            _ => a.cmp(&b),
        }
    }
}

// ============================================================================
// GROUP KEY
// ============================================================================

/// A composite key: the ids of one level's value and of all levels above it.
/// `values[0]` is the node's own level, the last entry is the top level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub values: SmallVec<[ValueId; 4]>,
}

impl GroupKey {
    pub fn new(values: &[ValueId]) -> Self {
        GroupKey {
            values: SmallVec::from_slice(values),
        }
    }

    /// Key for `level` taken from a record's full level ids.
    pub fn suffix(record_values: &[ValueId], level: usize) -> Self {
        Self::new(&record_values[level..])
    }
}

// ============================================================================
// RATIO ACCUMULATOR
// ============================================================================

/// Running sums for one node: the size metric and both halves of the color ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioAccumulator {
    pub value: f64,
    pub numerator: f64,
    pub denominator: f64,
}

impl RatioAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64, numerator: f64, denominator: f64) {
        self.value += value;
        self.numerator += numerator;
        self.denominator += denominator;
    }

    /// Ratio of the sums. NaN when the denominator sums to zero.
    pub fn ratio(&self) -> f64 {
        if self.denominator == 0.0 {
            f64::NAN
        } else {
            self.numerator / self.denominator
        }
    }
}

// ============================================================================
// ROLLUP CACHE
// ============================================================================

/// A single source record, stored as interned level ids plus numeric inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    /// ValueIds for each level, bottom level first.
    pub values: Vec<ValueId>,

    pub value: f64,
    pub numerator: f64,
    pub denominator: f64,
}

/// The validated, interned form of a table for one hierarchy definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupCache {
    /// One field cache per level, bottom level first.
    pub fields: Vec<FieldCache>,

    pub records: Vec<CacheRecord>,

    /// Label for empty keys (only set when they are kept as a category).
    null_label: Option<String>,
}

impl RollupCache {
    /// Resolves every referenced column, then interns and validates all rows.
    /// Fails before producing anything if a column is missing, the table is
    /// empty, a summed cell is text, or a level cell is empty under `Reject`.
    pub fn build(table: &DataTable, definition: &HierarchyDefinition) -> RollupResult<Self> {
        let level_cols = definition
            .levels
            .iter()
            .map(|l| resolve_column(table, l))
            .collect::<RollupResult<Vec<_>>>()?;
        let value_col = resolve_column(table, &definition.value_column)?;
        let num_col = resolve_column(table, &definition.color_columns.numerator)?;
        let den_col = resolve_column(table, &definition.color_columns.denominator)?;

        if table.is_empty() {
            return Err(RollupError::EmptyInput);
        }

        let mut fields: Vec<FieldCache> = definition
            .levels
            .iter()
            .map(|l| FieldCache::new(l.clone()))
            .collect();
        let mut records = Vec::with_capacity(table.row_count());

        for (row_idx, row) in table.rows().iter().enumerate() {
            let mut values = Vec::with_capacity(level_cols.len());
            for (field, &col) in fields.iter_mut().zip(&level_cols) {
                let cell = row.get(col).unwrap_or(&EMPTY_CELL);
                if cell.is_empty() && definition.null_keys == NullKeyPolicy::Reject {
                    return Err(RollupError::NullGroupKey {
                        column: field.name.clone(),
                        row: row_idx,
                    });
                }
                values.push(field.intern(CacheValue::from(cell)));
            }

            records.push(CacheRecord {
                values,
                value: numeric_cell(row, value_col, &definition.value_column, row_idx)?,
                numerator: numeric_cell(row, num_col, &definition.color_columns.numerator, row_idx)?,
                denominator: numeric_cell(row, den_col, &definition.color_columns.denominator, row_idx)?,
            });
        }

        let null_label = definition.null_keys.label();
        for field in &fields {
            field.ensure_unique_labels(null_label)?;
        }

        log::debug!(
            target: "rollup",
            "cache built: {} records, unique values per level {:?}",
            records.len(),
            fields.iter().map(|f| f.unique_count()).collect::<Vec<_>>()
        );

        Ok(RollupCache {
            fields,
            records,
            null_label: null_label.map(|l| l.to_string()),
        })
    }

    pub fn level_count(&self) -> usize {
        self.fields.len()
    }

    /// Display label of an interned id at a level.
    pub fn label(&self, level: usize, id: ValueId) -> String {
        if id == VALUE_ID_EMPTY {
            return self.null_label.clone().unwrap_or_default();
        }
        self.fields[level]
            .get_value(id)
            .map(|v| v.display_value())
            .unwrap_or_default()
    }

    /// Orders two keys of the same level: the level's own value first, then
    /// each ancestor from the nearest to the top.
    pub fn compare_keys(&self, level: usize, a: &GroupKey, b: &GroupKey) -> Ordering {
        for offset in 0..a.values.len().min(b.values.len()) {
            let ord = self.fields[level + offset].compare_ids(a.values[offset], b.values[offset]);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

// ============================================================================
// COLUMN HELPERS
// ============================================================================

/// Looks up a column by name, failing with `MissingColumn`.
pub fn resolve_column(table: &DataTable, name: &str) -> RollupResult<usize> {
    table
        .column_index(name)
        .ok_or_else(|| RollupError::MissingColumn(name.to_string()))
}

/// Numeric value of a cell that is being summed.
pub(crate) fn numeric_cell(
    row: &[CellValue],
    col: usize,
    column: &str,
    row_idx: usize,
) -> RollupResult<f64> {
    row.get(col)
        .unwrap_or(&EMPTY_CELL)
        .as_number()
        .ok_or_else(|| RollupError::NonNumericValue {
            column: column.to_string(),
            row: row_idx,
        })
}

/// Sorted distinct values of a column, empty cells included.
/// This is what a filter widget offers as choices.
pub fn distinct_values(table: &DataTable, column: &str) -> RollupResult<Vec<CacheValue>> {
    let col = resolve_column(table, column)?;
    let mut field = FieldCache::new(column.to_string());
    for cell in table.column_values(col) {
        field.intern(CacheValue::from(cell));
    }

    let mut values = Vec::with_capacity(field.unique_count() + 1);
    if field.has_empty() {
        values.push(CacheValue::Empty);
    }
    let ids = field.sorted_ids().to_vec();
    for id in ids {
        if let Some(value) = field.get_value(id) {
            values.push(value.clone());
        }
    }
    Ok(values)
}
