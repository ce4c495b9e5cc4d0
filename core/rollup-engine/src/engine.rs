//! FILENAME: core/rollup-engine/src/engine.rs
//! Rollup Engine - Turns a flat table into a tree table.
//!
//! This module takes a HierarchyDefinition (configuration) and a DataTable
//! (data) and produces a TreeTable (nodes ready for a sunburst/icicle chart).
//!
//! Algorithm:
//! 1. Validate the definition and intern the table into a RollupCache
//! 2. For each level i, group records by the ids of levels[i..] (the node's
//!    own level plus every ancestor), so equal labels under different
//!    parents stay separate nodes
//! 3. Sum value, numerator and denominator per group; color = num / den
//! 4. Emit the groups of each level sorted by key, finest level first
//! 5. Append the synthetic root aggregating every record

use engine::DataTable;
use rustc_hash::FxHashMap;

use crate::cache::{GroupKey, RatioAccumulator, RollupCache};
use crate::definition::{HierarchyDefinition, ROOT_ID};
use crate::error::RollupResult;
use crate::view::{TreeNode, TreeTable};

/// Builds the tree table for `definition` over `table`.
///
/// Fails before any aggregation with `InvalidDefinition`, `MissingColumn`,
/// `EmptyInput`, `NonNumericValue` or `NullGroupKey`. A node whose
/// denominator sums to zero gets a NaN color; that is not an error.
pub fn build_hierarchy(table: &DataTable, definition: &HierarchyDefinition) -> RollupResult<TreeTable> {
    definition.validate()?;
    let cache = RollupCache::build(table, definition)?;
    Ok(build_from_cache(&cache))
}

/// Builds the tree table from an already validated cache.
pub fn build_from_cache(cache: &RollupCache) -> TreeTable {
    let depth = cache.level_count();
    let mut tree = TreeTable::with_capacity(estimate_node_count(cache));

    for level in 0..depth {
        tree.begin_level();
        let groups = aggregate_level(cache, level);
        let mut undefined_colors = 0usize;

        for (key, acc) in groups {
            let color = acc.ratio();
            if color.is_nan() {
                undefined_colors += 1;
            }

            // key.values is bottom-up; the path is top-down
            let path: Vec<String> = key
                .values
                .iter()
                .enumerate()
                .rev()
                .map(|(offset, &id)| cache.label(level + offset, id))
                .collect();
            let id = cache.label(level, key.values[0]);
            let parent = match key.values.get(1) {
                Some(&parent_id) => cache.label(level + 1, parent_id),
                None => ROOT_ID.to_string(),
            };

            tree.push_node(
                TreeNode {
                    id,
                    parent,
                    value: acc.value,
                    color,
                },
                path,
            );
        }

        log::debug!(
            target: "rollup",
            "level {} ({}): {} nodes, {} without a color score",
            level,
            cache.fields[level].name,
            tree.level(level).len(),
            undefined_colors
        );
    }

    let mut grand = RatioAccumulator::new();
    for record in &cache.records {
        grand.add(record.value, record.numerator, record.denominator);
    }
    tree.push_root(grand.value, grand.ratio());

    log::info!(
        target: "rollup",
        "built tree: {} levels, {} nodes, total value {}",
        depth,
        tree.len(),
        grand.value
    );

    tree
}

/// Sums every record into its group for one level, sorted by key.
fn aggregate_level(cache: &RollupCache, level: usize) -> Vec<(GroupKey, RatioAccumulator)> {
    let mut groups: FxHashMap<GroupKey, RatioAccumulator> = FxHashMap::default();

    for record in &cache.records {
        groups
            .entry(GroupKey::suffix(&record.values, level))
            .or_default()
            .add(record.value, record.numerator, record.denominator);
    }

    let mut sorted: Vec<(GroupKey, RatioAccumulator)> = groups.into_iter().collect();
    sorted.sort_by(|(a, _), (b, _)| cache.compare_keys(level, a, b));
    sorted
}

fn estimate_node_count(cache: &RollupCache) -> usize {
    cache
        .fields
        .iter()
        .map(|f| f.unique_count() + 1)
        .sum::<usize>()
        + 1
}
