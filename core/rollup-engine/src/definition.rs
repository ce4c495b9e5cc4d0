//! FILENAME: core/rollup-engine/src/definition.rs
//! Rollup Definition - The serializable configuration.
//!
//! This module contains the types needed to DESCRIBE a rollup.
//! These structures are designed to be:
//! - Serializable (stored in the app configuration file)
//! - Cheap to clone and compare
//! - Immutable snapshots of user intent

use serde::{Deserialize, Serialize};
use crate::error::{RollupError, RollupResult};

/// Identifier of the synthetic root node that aggregates the whole table.
pub const ROOT_ID: &str = "total";

/// Parent value carried by the root node.
pub const ROOT_PARENT: &str = "";

/// Label used for empty group keys when they are kept as their own category.
pub const DEFAULT_NULL_LABEL: &str = "(blank)";

fn default_null_label() -> String {
    DEFAULT_NULL_LABEL.to_string()
}

// ============================================================================
// COLOR METRIC
// ============================================================================

/// The two columns whose sums form the color score (numerator / denominator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorColumns {
    pub numerator: String,
    pub denominator: String,
}

impl ColorColumns {
    pub fn new(numerator: &str, denominator: &str) -> Self {
        ColorColumns {
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
        }
    }
}

// ============================================================================
// NULL KEYS
// ============================================================================

/// What to do with an empty cell in a grouping column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NullKeyPolicy {
    /// Fail with `NullGroupKey` before any aggregation.
    Reject,
    /// Treat empty cells as one more category with the given label.
    Category {
        #[serde(default = "default_null_label")]
        label: String,
    },
}

impl NullKeyPolicy {
    pub fn category() -> Self {
        NullKeyPolicy::Category {
            label: default_null_label(),
        }
    }

    /// The label given to empty keys, or None when they are rejected.
    pub fn label(&self) -> Option<&str> {
        match self {
            NullKeyPolicy::Reject => None,
            NullKeyPolicy::Category { label } => Some(label),
        }
    }
}

impl Default for NullKeyPolicy {
    fn default() -> Self {
        NullKeyPolicy::Reject
    }
}

// ============================================================================
// HIERARCHY DEFINITION
// ============================================================================

/// Complete definition of a hierarchical rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyDefinition {
    /// Grouping levels, bottom (most specific) to top (most general).
    pub levels: Vec<String>,

    /// Column summed into each node's `value`.
    pub value_column: String,

    /// Columns summed independently and divided into each node's `color`.
    pub color_columns: ColorColumns,

    /// Handling of empty cells in the level columns.
    #[serde(default)]
    pub null_keys: NullKeyPolicy,
}

impl HierarchyDefinition {
    pub fn new(levels: &[&str], value_column: &str, color_columns: ColorColumns) -> Self {
        HierarchyDefinition {
            levels: levels.iter().map(|l| l.to_string()).collect(),
            value_column: value_column.to_string(),
            color_columns,
            null_keys: NullKeyPolicy::Reject,
        }
    }

    pub fn with_null_keys(mut self, policy: NullKeyPolicy) -> Self {
        self.null_keys = policy;
        self
    }

    /// Number of hierarchy levels below the root.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Checks the definition on its own, without looking at any data.
    pub fn validate(&self) -> RollupResult<()> {
        if self.levels.is_empty() {
            return Err(RollupError::InvalidDefinition(
                "at least one level is required".to_string(),
            ));
        }
        if let Some(blank) = self.referenced_columns().into_iter().find(|c| c.trim().is_empty()) {
            return Err(RollupError::InvalidDefinition(format!(
                "column name '{}' is blank",
                blank
            )));
        }
        Ok(())
    }

    /// Every column the rollup reads: levels, value, numerator, denominator.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.levels.iter().map(|l| l.as_str()).collect();
        columns.push(&self.value_column);
        columns.push(&self.color_columns.numerator);
        columns.push(&self.color_columns.denominator);
        columns
    }
}

// ============================================================================
// BREAKDOWN DEFINITION
// ============================================================================

/// Definition of a stacked-bar breakdown (category x series percentages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownDefinition {
    /// Column whose values become the bars.
    pub category: String,

    /// Column whose values become the stacked segments.
    pub series: String,

    /// Column to sum. None counts records instead.
    #[serde(default)]
    pub value_column: Option<String>,

    #[serde(default)]
    pub null_keys: NullKeyPolicy,
}

impl BreakdownDefinition {
    pub fn counting(category: &str, series: &str) -> Self {
        BreakdownDefinition {
            category: category.to_string(),
            series: series.to_string(),
            value_column: None,
            null_keys: NullKeyPolicy::Reject,
        }
    }

    pub fn summing(category: &str, series: &str, value_column: &str) -> Self {
        BreakdownDefinition {
            value_column: Some(value_column.to_string()),
            ..Self::counting(category, series)
        }
    }
}
