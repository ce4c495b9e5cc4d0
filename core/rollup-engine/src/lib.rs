//! FILENAME: core/rollup-engine/src/lib.rs
//! Hierarchical rollup subsystem for drilldown.
//!
//! This crate turns a flat table into the parent/child "tree table" that
//! drill-down charts (sunburst, icicle, treemap) consume, and into the
//! category x series percentages behind stacked bars. It depends on `engine`
//! only for shared types (CellValue, DataTable).
//!
//! Layers:
//! - `definition`: Serializable configuration (what the rollup IS)
//! - `filter`: Record selection applied before aggregating
//! - `cache`: Interned internal representation (HOW we group)
//! - `view`: Tree output and renderer payload (WHAT we display)
//! - `engine`: Rollup calculation (HOW we calculate)
//! - `breakdown`: Stacked-bar percentages

pub mod breakdown;
pub mod cache;
pub mod definition;
pub mod engine;
pub mod error;
pub mod filter;
pub mod view;

pub use breakdown::{build_breakdown, Breakdown, BreakdownCell};
pub use cache::{distinct_values, CacheValue, RollupCache};
pub use definition::*;
pub use self::engine::{build_from_cache, build_hierarchy};
pub use error::{RollupError, RollupResult};
pub use filter::{apply_filters, FilterCondition, FilterValue, RecordFilter};
pub use view::{SunburstPayload, TreeNode, TreeTable};
