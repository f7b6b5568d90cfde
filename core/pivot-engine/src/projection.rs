//! FILENAME: core/pivot-engine/src/projection.rs
//! Visibility Projector - flattens one axis tree into display order.
//!
//! Rules per non-leaf group, outermost first:
//! - effectively collapsed: emit its subtotal line and skip the children
//! - otherwise: emit the children, then a subtotal line when the dimension
//!   shows totals and the group has more than one child
//!
//! A lone child's values equal its parent's, so a subtotal would only repeat
//! them. Leaves never carry subtotals. The grand total, when enabled, closes
//! the axis.

use serde::{Deserialize, Serialize};

use crate::collapse::CollapseState;
use crate::definition::{Axis, ShowTotals};
use crate::path::DimensionPath;
use crate::tree::{GroupNode, PivotTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayKind {
    Leaf,
    Subtotal,
    GrandTotal,
}

/// One visible line of an axis (a row on the row axis, a column on the
/// column axis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub kind: DisplayKind,

    /// Group the line stands for. Empty for the grand total.
    pub path: DimensionPath,

    pub label: String,

    /// Whether the group is shown collapsed (subtotal lines only).
    pub is_collapsed: bool,
}

impl DisplayRow {
    fn leaf(node: &GroupNode) -> Self {
        DisplayRow {
            kind: DisplayKind::Leaf,
            path: node.path.clone(),
            label: node.label(),
            is_collapsed: false,
        }
    }

    fn subtotal(node: &GroupNode, is_collapsed: bool) -> Self {
        DisplayRow {
            kind: DisplayKind::Subtotal,
            path: node.path.clone(),
            label: subtotal_label(node),
            is_collapsed,
        }
    }

    pub fn grand_total(axis: Axis) -> Self {
        DisplayRow {
            kind: DisplayKind::GrandTotal,
            path: DimensionPath::root(),
            label: axis.grand_total_label().to_string(),
            is_collapsed: false,
        }
    }

    /// Zero-based depth of the group; the grand total sits at depth 0.
    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn is_total(&self) -> bool {
        !matches!(self.kind, DisplayKind::Leaf)
    }
}

/// "Totals for X", where X is the group's display value.
pub fn subtotal_label(node: &GroupNode) -> String {
    format!("Totals for {}", node.label())
}

/// Projection switches beyond collapse and per-dimension totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectOptions {
    pub show_grand_total: bool,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        ProjectOptions {
            show_grand_total: true,
        }
    }
}

/// Flattens `tree` for `axis` with the grand total enabled.
pub fn project(
    tree: &[GroupNode],
    collapse: &CollapseState,
    show_totals: &ShowTotals,
    axis: Axis,
) -> Vec<DisplayRow> {
    project_with(tree, collapse, show_totals, axis, ProjectOptions::default())
}

pub fn project_with(
    tree: &[GroupNode],
    collapse: &CollapseState,
    show_totals: &ShowTotals,
    axis: Axis,
    options: ProjectOptions,
) -> Vec<DisplayRow> {
    let mut out = Vec::new();
    project_nodes(tree, collapse, show_totals, axis, &mut out);
    if options.show_grand_total && !tree.is_empty() {
        out.push(DisplayRow::grand_total(axis));
    }
    out
}

fn project_nodes(
    nodes: &[GroupNode],
    collapse: &CollapseState,
    show_totals: &ShowTotals,
    axis: Axis,
    out: &mut Vec<DisplayRow>,
) {
    for node in nodes {
        if node.is_leaf() {
            out.push(DisplayRow::leaf(node));
            continue;
        }

        let totals = show_totals.is_enabled(&node.dimension);
        if totals && collapse.is_collapsed_at(axis, &node.path, &node.dimension) {
            out.push(DisplayRow::subtotal(node, true));
            continue;
        }

        project_nodes(&node.children, collapse, show_totals, axis, out);

        if totals && node.children.len() > 1 {
            out.push(DisplayRow::subtotal(node, false));
        }
    }
}

/// Value at the intersection of a visible row and a visible column.
/// Subtotal and grand-total lines resolve to their group's aggregate.
pub fn cell_value(
    tree: &PivotTree,
    row: &DisplayRow,
    column: &DisplayRow,
    measure: usize,
) -> Option<f64> {
    tree.aggregates.value(&row.path, &column.path, measure)
}
