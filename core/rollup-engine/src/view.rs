//! FILENAME: core/rollup-engine/src/view.rs
//! Tree View - The output of a rollup, ready for a hierarchical chart.
//!
//! A `TreeTable` is a flat list of nodes (id / parent / value / color) in
//! level order, finest level first and the root last. Ids are only unique
//! together with their ancestry, so the table also keeps each node's full
//! path and the slice of nodes that belongs to each level.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::definition::{ROOT_ID, ROOT_PARENT};

// ============================================================================
// TREE NODE
// ============================================================================

/// One row of the tree table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub parent: String,
    pub value: f64,
    /// Ratio-of-sums color score. NaN when the denominator summed to zero.
    pub color: f64,
}

impl TreeNode {
    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID && self.parent == ROOT_PARENT
    }

    pub fn has_color(&self) -> bool {
        !self.color.is_nan()
    }
}

// NaN colors compare equal so identical rollups compare equal.
impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.parent == other.parent
            && self.value == other.value
            && (self.color == other.color || (self.color.is_nan() && other.color.is_nan()))
    }
}

// ============================================================================
// TREE TABLE
// ============================================================================

/// The flat tree produced by `build_hierarchy`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeTable {
    nodes: Vec<TreeNode>,

    /// Ancestry of each node, top level first and the node itself last.
    /// The root's path is empty.
    paths: Vec<Vec<String>>,

    /// Node range of each hierarchy level, bottom level first.
    levels: Vec<Range<usize>>,
}

impl TreeTable {
    pub fn with_capacity(capacity: usize) -> Self {
        TreeTable {
            nodes: Vec::with_capacity(capacity),
            paths: Vec::with_capacity(capacity),
            levels: Vec::new(),
        }
    }

    /// Starts a new level; nodes pushed afterwards belong to it.
    pub(crate) fn begin_level(&mut self) {
        let start = self.nodes.len();
        self.levels.push(start..start);
    }

    /// Appends a node to the current level. `path` is top-down and ends with the node's id.
    pub(crate) fn push_node(&mut self, node: TreeNode, path: Vec<String>) {
        self.nodes.push(node);
        self.paths.push(path);
        if let Some(level) = self.levels.last_mut() {
            level.end = self.nodes.len();
        }
    }

    /// Appends the synthetic root (outside every level).
    pub(crate) fn push_root(&mut self, value: f64, color: f64) {
        self.nodes.push(TreeNode {
            id: ROOT_ID.to_string(),
            parent: ROOT_PARENT.to_string(),
            value,
            color,
        });
        self.paths.push(Vec::new());
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root node, always the last row of a built table.
    pub fn root(&self) -> Option<&TreeNode> {
        self.nodes.last().filter(|n| n.is_root())
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Nodes of one hierarchy level (0 = finest).
    pub fn level(&self, level: usize) -> &[TreeNode] {
        match self.levels.get(level) {
            Some(range) => &self.nodes[range.clone()],
            None => &[],
        }
    }

    /// Ancestry of the node at `index`, top level first.
    pub fn path_of(&self, index: usize) -> &[String] {
        self.paths.get(index).map(|p| p.as_slice()).unwrap_or(&[])
    }

    /// Direct children of the node identified by `path` (empty path = root).
    pub fn children_of(&self, path: &[String]) -> Vec<&TreeNode> {
        self.nodes
            .iter()
            .zip(&self.paths)
            .filter(|(_, p)| p.len() == path.len() + 1 && p.starts_with(path))
            .map(|(n, _)| n)
            .collect()
    }

    /// Finds a node by its ancestry.
    pub fn find(&self, path: &[&str]) -> Option<&TreeNode> {
        self.nodes
            .iter()
            .zip(&self.paths)
            .find(|(_, p)| p.len() == path.len() && p.iter().zip(path).all(|(a, b)| a == b))
            .map(|(n, _)| n)
    }
}

// ============================================================================
// SUNBURST PAYLOAD
// ============================================================================

/// Parallel arrays in the shape hierarchical chart renderers take
/// (sunburst, icicle, treemap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunburstPayload {
    /// Path-qualified ids, unique across the whole tree (`/` in labels is escaped).
    pub ids: Vec<String>,
    /// Plain node ids, shown on the chart.
    pub labels: Vec<String>,
    /// Path-qualified parent ids; the root's parent is empty.
    pub parents: Vec<String>,
    pub values: Vec<f64>,
    /// Color scores; None where undefined so the renderer uses its default color.
    pub colors: Vec<Option<f64>>,
    /// Node values already include their children.
    pub branch_values: String,
    /// Center of the color scale: the root's color score.
    pub color_midpoint: Option<f64>,
}

impl SunburstPayload {
    pub fn from_tree(tree: &TreeTable) -> Self {
        let mut payload = SunburstPayload {
            ids: Vec::with_capacity(tree.len()),
            labels: Vec::with_capacity(tree.len()),
            parents: Vec::with_capacity(tree.len()),
            values: Vec::with_capacity(tree.len()),
            colors: Vec::with_capacity(tree.len()),
            branch_values: "total".to_string(),
            color_midpoint: tree.root().and_then(finite_color),
        };

        for (index, node) in tree.nodes().iter().enumerate() {
            let path = tree.path_of(index);
            let (id, parent) = match path.split_last() {
                Some((_, ancestors)) => (qualified_id(path), qualified_id(ancestors)),
                None => (ROOT_ID.to_string(), ROOT_PARENT.to_string()),
            };
            payload.ids.push(id);
            payload.labels.push(node.id.clone());
            payload.parents.push(parent);
            payload.values.push(node.value);
            payload.colors.push(finite_color(node));
        }

        payload
    }
}

fn finite_color(node: &TreeNode) -> Option<f64> {
    node.has_color().then_some(node.color)
}

/// Joins a path under the root with `/`. Inside a segment `\` and `/` are
/// written as `\\` and `\/`, so distinct paths never share an id.
fn qualified_id(path: &[String]) -> String {
    let mut id = ROOT_ID.to_string();
    for part in path {
        id.push('/');
        for ch in part.chars() {
            if ch == '/' || ch == '\\' {
                id.push('\\');
            }
            id.push(ch);
        }
    }
    id
}
