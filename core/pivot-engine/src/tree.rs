//! FILENAME: core/pivot-engine/src/tree.rs
//! Dimension Tree Builder - grouped result rows into axis hierarchies.
//!
//! Each axis becomes a tree whose depth-k nodes are the distinct values of
//! the k-th axis dimension under a given parent. Alongside the trees the
//! builder fills an aggregate table keyed by (row path prefix, column path
//! prefix), so any leaf, subtotal or grand-total intersection resolves with a
//! single lookup.
//!
//! Subtotals come from two places:
//! - rows the query already rolled up (flagged by the pivot-grouping column)
//! - re-aggregation of leaf rows, for measures where that is exact

use engine::{AggregationKind, DimensionValue, QueryResult};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cmp::Ordering;

use crate::definition::{Axis, DimensionKey, MeasureKey, SortBy, SortDirection, SortDirective};
use crate::error::{PivotError, PivotResult};
use crate::{log_debug, log_info, log_warn};
use crate::path::DimensionPath;

/// One value per displayed measure. `None` means no value is available.
pub type MeasureValues = SmallVec<[Option<f64>; 4]>;

// ============================================================================
// KEYS & MEASURES
// ============================================================================

/// Intersection of a row group and a column group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub row: DimensionPath,
    pub col: DimensionPath,
}

impl GroupKey {
    pub fn new(row: DimensionPath, col: DimensionPath) -> Self {
        GroupKey { row, col }
    }
}

/// A measure resolved against the result columns.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureSpec {
    pub key: MeasureKey,
    pub display_name: String,
    pub aggregation: AggregationKind,
    column: usize,
}

// ============================================================================
// ACCUMULATION
// ============================================================================

/// Running re-aggregation of finer-grained measure values.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: u64,
    min: Option<f64>,
    max: Option<f64>,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Value for a group, or None if it cannot be derived exactly.
    fn compute(&self, aggregation: AggregationKind) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        match aggregation {
            // A count of counts is their sum.
            AggregationKind::Sum | AggregationKind::Count => Some(self.sum),
            AggregationKind::Min => self.min,
            AggregationKind::Max => self.max,
            _ => None,
        }
    }
}

// ============================================================================
// AGGREGATE TABLE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct AggregateTable {
    values: FxHashMap<GroupKey, MeasureValues>,
}

impl AggregateTable {
    pub fn get(&self, row: &DimensionPath, col: &DimensionPath) -> Option<&MeasureValues> {
        // Lookups by reference would need a borrowed key type; paths are short.
        self.values.get(&GroupKey::new(row.clone(), col.clone()))
    }

    pub fn value(&self, row: &DimensionPath, col: &DimensionPath, measure: usize) -> Option<f64> {
        self.get(row, col).and_then(|v| v.get(measure).copied().flatten())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// TREE
// ============================================================================

/// A group on one axis.
#[derive(Debug, Clone)]
pub struct GroupNode {
    /// Dimension this node groups by.
    pub dimension: DimensionKey,

    pub value: DimensionValue,

    /// Values from the axis root down to and including this node.
    pub path: DimensionPath,

    /// Child groups in display order.
    pub children: Vec<GroupNode>,

    /// Measure values for this group across the whole perpendicular axis.
    pub subtotals: MeasureValues,

    /// Leaf nodes only: measure values per perpendicular leaf path.
    pub cell_values: FxHashMap<DimensionPath, MeasureValues>,
}

impl GroupNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn label(&self) -> String {
        self.value.display_value()
    }

    /// Zero-based nesting depth.
    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn leaf_count(&self) -> usize {
        if self.children.is_empty() {
            1
        } else {
            self.children.iter().map(|c| c.leaf_count()).sum()
        }
    }
}

fn find_in<'n>(nodes: &'n [GroupNode], path: &DimensionPath) -> Option<&'n GroupNode> {
    let mut current = nodes;
    let mut found = None;
    for value in path.values() {
        let node = current.iter().find(|n| &n.value == value)?;
        current = &node.children;
        found = Some(node);
    }
    found
}

/// Both axis hierarchies plus the aggregate table behind them.
#[derive(Debug, Clone)]
pub struct PivotTree {
    pub row_dimensions: Vec<DimensionKey>,
    pub column_dimensions: Vec<DimensionKey>,
    pub measures: Vec<MeasureSpec>,
    pub rows: Vec<GroupNode>,
    pub columns: Vec<GroupNode>,
    pub aggregates: AggregateTable,
}

impl PivotTree {
    pub fn dimensions(&self, axis: Axis) -> &[DimensionKey] {
        match axis {
            Axis::Row => &self.row_dimensions,
            Axis::Column => &self.column_dimensions,
        }
    }

    pub fn nodes(&self, axis: Axis) -> &[GroupNode] {
        match axis {
            Axis::Row => &self.rows,
            Axis::Column => &self.columns,
        }
    }

    pub fn find(&self, axis: Axis, path: &DimensionPath) -> Option<&GroupNode> {
        find_in(self.nodes(axis), path)
    }

    pub fn measure_index(&self, key: &str) -> Option<usize> {
        self.measures.iter().position(|m| m.key == key)
    }

    /// Totals over every row and column.
    pub fn grand_totals(&self) -> MeasureValues {
        let root = DimensionPath::root();
        self.aggregates
            .get(&root, &root)
            .cloned()
            .unwrap_or_else(|| self.measures.iter().map(|_| None).collect())
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Insertion-ordered node used while scanning rows.
#[derive(Default)]
struct NodeBuilder {
    value: DimensionValue,
    children: Vec<NodeBuilder>,
    index: FxHashMap<DimensionValue, usize>,
}

impl NodeBuilder {
    fn insert(&mut self, path: &DimensionPath) {
        let mut node = self;
        for value in path.values() {
            let existing = node.index.get(value).copied();
            let idx = match existing {
                Some(idx) => idx,
                None => {
                    node.children.push(NodeBuilder {
                        value: value.clone(),
                        ..Default::default()
                    });
                    let idx = node.children.len() - 1;
                    node.index.insert(value.clone(), idx);
                    idx
                }
            };
            node = &mut node.children[idx];
        }
    }
}

/// Builds a [`PivotTree`] from a grouped result.
pub struct TreeBuilder<'a> {
    result: &'a QueryResult,
    row_dimensions: &'a [DimensionKey],
    column_dimensions: &'a [DimensionKey],
    measures: &'a [MeasureKey],
    sorts: &'a [SortDirective],
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        result: &'a QueryResult,
        row_dimensions: &'a [DimensionKey],
        column_dimensions: &'a [DimensionKey],
        measures: &'a [MeasureKey],
    ) -> Self {
        TreeBuilder {
            result,
            row_dimensions,
            column_dimensions,
            measures,
            sorts: &[],
        }
    }

    pub fn with_sorts(mut self, sorts: &'a [SortDirective]) -> Self {
        self.sorts = sorts;
        self
    }

    fn resolve_dimensions(&self, keys: &[DimensionKey]) -> PivotResult<Vec<usize>> {
        keys.iter()
            .map(|key| {
                self.result
                    .column_index(key)
                    .filter(|&i| self.result.columns[i].is_dimension())
                    .ok_or_else(|| PivotError::UnknownDimensionInSettings { key: key.clone() })
            })
            .collect()
    }

    fn resolve_measures(&self) -> PivotResult<Vec<MeasureSpec>> {
        self.measures
            .iter()
            .map(|key| {
                let column = self
                    .result
                    .column_index(key)
                    .ok_or_else(|| PivotError::UnknownMeasure { key: key.clone() })?;
                let col = &self.result.columns[column];
                let aggregation = col
                    .aggregation()
                    .ok_or_else(|| PivotError::UnknownMeasure { key: key.clone() })?;
                Ok(MeasureSpec {
                    key: key.clone(),
                    display_name: col.display_name.clone(),
                    aggregation,
                    column,
                })
            })
            .collect()
    }

    /// Bit position of each axis dimension within the pivot-grouping mask.
    fn breakout_bits(&self, keys: &[DimensionKey]) -> Vec<u32> {
        let breakouts = self.result.dimension_keys();
        keys.iter()
            .map(|k| breakouts.iter().position(|b| b == k).unwrap_or(0) as u32)
            .collect()
    }

    pub fn build(&self) -> PivotResult<PivotTree> {
        if !self.result.is_aggregated() {
            return Err(PivotError::UnaggregatedQuery);
        }

        let mut seen: Vec<&DimensionKey> = Vec::new();
        for key in self.row_dimensions.iter().chain(self.column_dimensions.iter()) {
            if seen.contains(&key) {
                return Err(PivotError::DuplicateDimension { key: key.clone() });
            }
            seen.push(key);
        }

        let row_cols = self.resolve_dimensions(self.row_dimensions)?;
        let col_cols = self.resolve_dimensions(self.column_dimensions)?;
        let measures = self.resolve_measures()?;
        let row_bits = self.breakout_bits(self.row_dimensions);
        let col_bits = self.breakout_bits(self.column_dimensions);
        let grouping = self.result.grouping_index();
        let width = self.result.columns.len();

        let mut row_root = NodeBuilder::default();
        let mut col_root = NodeBuilder::default();
        let mut leaves: FxHashMap<GroupKey, MeasureValues> = FxHashMap::default();
        let mut derived: FxHashMap<GroupKey, Vec<Accumulator>> = FxHashMap::default();
        let mut upstream: FxHashMap<GroupKey, MeasureValues> = FxHashMap::default();

        for (row_idx, row) in self.result.rows.iter().enumerate() {
            if row.len() < width {
                return Err(PivotError::MissingColumn {
                    row: row_idx,
                    key: self.result.columns[row.len()].key.clone(),
                });
            }

            let mask = grouping
                .and_then(|i| row[i].as_f64())
                .map(|m| m as u64)
                .unwrap_or(0);
            let row_path = DimensionPath::from_values(row_cols.iter().map(|&i| row[i].clone()));
            let col_path = DimensionPath::from_values(col_cols.iter().map(|&i| row[i].clone()));
            let values: MeasureValues = measures.iter().map(|m| row[m.column].as_f64()).collect();

            if mask != 0 {
                match rollup_key(mask, &row_path, &row_bits, &col_path, &col_bits) {
                    Some(key) => {
                        upstream.insert(key, values);
                    }
                    None => {
                        log_debug!("PIVOT", "ignoring subtotal row {} with mask {}", row_idx, mask);
                    }
                }
                continue;
            }

            let key = GroupKey::new(row_path, col_path);
            if leaves.contains_key(&key) {
                log_warn!("PIVOT", "duplicate leaf row {} in grouped result ignored", row_idx);
                continue;
            }
            row_root.insert(&key.row);
            col_root.insert(&key.col);

            for r in 0..=key.row.len() {
                for c in 0..=key.col.len() {
                    let prefix = GroupKey::new(key.row.prefix(r), key.col.prefix(c));
                    let accs = derived
                        .entry(prefix)
                        .or_insert_with(|| vec![Accumulator::default(); measures.len()]);
                    for (acc, value) in accs.iter_mut().zip(values.iter()) {
                        if let Some(v) = value {
                            acc.add(*v);
                        }
                    }
                }
            }
            leaves.insert(key, values);
        }

        // Supplied subtotals win; otherwise derive when exact.
        let mut aggregates = AggregateTable::default();
        for (key, accs) in derived {
            let full = key.row.len() == row_cols.len() && key.col.len() == col_cols.len();
            let supplied = upstream.get(&key);
            let values: MeasureValues = measures
                .iter()
                .enumerate()
                .map(|(m, spec)| {
                    supplied.and_then(|v| v[m]).or_else(|| {
                        if spec.aggregation.is_derivable() {
                            accs[m].compute(spec.aggregation)
                        } else if full {
                            leaves.get(&key).and_then(|v| v[m])
                        } else {
                            None
                        }
                    })
                })
                .collect();
            aggregates.values.insert(key, values);
        }
        for (key, values) in upstream {
            aggregates.values.entry(key).or_insert(values);
        }

        // Leaf intersections, indexed from both sides.
        let mut row_cells: FxHashMap<DimensionPath, FxHashMap<DimensionPath, MeasureValues>> =
            FxHashMap::default();
        let mut col_cells: FxHashMap<DimensionPath, FxHashMap<DimensionPath, MeasureValues>> =
            FxHashMap::default();
        for (key, values) in &aggregates.values {
            if key.row.len() == row_cols.len() && key.col.len() == col_cols.len() {
                row_cells
                    .entry(key.row.clone())
                    .or_default()
                    .insert(key.col.clone(), values.clone());
                col_cells
                    .entry(key.col.clone())
                    .or_default()
                    .insert(key.row.clone(), values.clone());
            }
        }

        let empty: MeasureValues = measures.iter().map(|_| None).collect();
        let mut ctx = FinalizeContext {
            axis: Axis::Row,
            dimensions: self.row_dimensions,
            aggregates: &aggregates,
            cells: &mut row_cells,
            empty: &empty,
        };
        let mut rows = ctx.finalize(row_root.children, &DimensionPath::root());
        let mut ctx = FinalizeContext {
            axis: Axis::Column,
            dimensions: self.column_dimensions,
            aggregates: &aggregates,
            cells: &mut col_cells,
            empty: &empty,
        };
        let mut columns = ctx.finalize(col_root.children, &DimensionPath::root());

        for sort in self.sorts {
            let measure = match &sort.by {
                SortBy::Value => None,
                SortBy::Measure(key) => Some(
                    measures
                        .iter()
                        .position(|m| &m.key == key)
                        .ok_or_else(|| PivotError::UnknownMeasure { key: key.clone() })?,
                ),
            };
            if let Some(depth) = self.row_dimensions.iter().position(|d| d == &sort.dimension) {
                sort_level(&mut rows, depth, measure, sort.direction);
            } else if let Some(depth) =
                self.column_dimensions.iter().position(|d| d == &sort.dimension)
            {
                sort_level(&mut columns, depth, measure, sort.direction);
            } else {
                log_debug!("PIVOT", "sort on unplaced dimension {} ignored", sort.dimension);
            }
        }

        log_info!(
            "PIVOT",
            "built tree: {} source rows, {} row groups, {} column groups, {} aggregates",
            self.result.rows.len(),
            rows.len(),
            columns.len(),
            aggregates.len()
        );

        Ok(PivotTree {
            row_dimensions: self.row_dimensions.to_vec(),
            column_dimensions: self.column_dimensions.to_vec(),
            measures,
            rows,
            columns,
            aggregates,
        })
    }
}

/// Builds the trees for `result` in first-appearance order.
pub fn build_tree(
    result: &QueryResult,
    row_dimensions: &[DimensionKey],
    column_dimensions: &[DimensionKey],
    measures: &[MeasureKey],
) -> PivotResult<PivotTree> {
    TreeBuilder::new(result, row_dimensions, column_dimensions, measures).build()
}

/// Maps a rolled-up row to the group it totals. Present dimensions must form
/// a prefix on each axis; anything else is not a group this pivot shows.
fn rollup_key(
    mask: u64,
    row_path: &DimensionPath,
    row_bits: &[u32],
    col_path: &DimensionPath,
    col_bits: &[u32],
) -> Option<GroupKey> {
    let rolled = |bit: u32| bit < 64 && mask & (1u64 << bit) != 0;
    let prefix_len = |bits: &[u32]| -> Option<usize> {
        let kept = bits.iter().take_while(|&&b| !rolled(b)).count();
        if bits[kept..].iter().all(|&b| rolled(b)) {
            Some(kept)
        } else {
            None
        }
    };
    let r = prefix_len(row_bits)?;
    let c = prefix_len(col_bits)?;
    Some(GroupKey::new(row_path.prefix(r), col_path.prefix(c)))
}

struct FinalizeContext<'c> {
    axis: Axis,
    dimensions: &'c [DimensionKey],
    aggregates: &'c AggregateTable,
    cells: &'c mut FxHashMap<DimensionPath, FxHashMap<DimensionPath, MeasureValues>>,
    empty: &'c MeasureValues,
}

impl FinalizeContext<'_> {
    fn finalize(&mut self, builders: Vec<NodeBuilder>, parent: &DimensionPath) -> Vec<GroupNode> {
        let depth = parent.len();
        let dimension = self.dimensions.get(depth).cloned().unwrap_or_default();
        builders
            .into_iter()
            .map(|builder| {
                let path = parent.child(builder.value.clone());
                let root = DimensionPath::root();
                let subtotals = match self.axis {
                    Axis::Row => self.aggregates.get(&path, &root),
                    Axis::Column => self.aggregates.get(&root, &path),
                }
                .cloned()
                .unwrap_or_else(|| self.empty.clone());
                let children = self.finalize(builder.children, &path);
                let cell_values = if children.is_empty() {
                    self.cells.remove(&path).unwrap_or_default()
                } else {
                    FxHashMap::default()
                };
                GroupNode {
                    dimension: dimension.clone(),
                    value: builder.value,
                    path,
                    children,
                    subtotals,
                    cell_values,
                }
            })
            .collect()
    }
}

fn sort_level(nodes: &mut [GroupNode], depth: usize, measure: Option<usize>, direction: SortDirection) {
    if depth > 0 {
        for node in nodes.iter_mut() {
            sort_level(&mut node.children, depth - 1, measure, direction);
        }
        return;
    }
    nodes.sort_by(|a, b| {
        let ordering = match measure {
            Some(m) => match (a.subtotals.get(m).copied().flatten(), b.subtotals.get(m).copied().flatten()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                // Missing values always go last.
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            None => a.value.cmp(&b.value),
        };
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::ResultColumn;

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn small_result() -> QueryResult {
        let mut result = QueryResult::new(vec![
            ResultColumn::dimension("SOURCE", "Source"),
            ResultColumn::dimension("CATEGORY", "Category"),
            ResultColumn::measure("count", "Count", AggregationKind::Count),
        ]);
        result.push_row(vec!["Google".into(), "Gizmo".into(), 5.0.into()]);
        result.push_row(vec!["Affiliate".into(), "Widget".into(), 2.0.into()]);
        result.push_row(vec!["Google".into(), "Widget".into(), 3.0.into()]);
        result.push_row(vec![DimensionValue::Null, "Gizmo".into(), 1.0.into()]);
        result
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let result = small_result();
        let tree = build_tree(&result, &keys(&["SOURCE", "CATEGORY"]), &[], &keys(&["count"])).unwrap();
        let labels: Vec<String> = tree.rows.iter().map(|n| n.label()).collect();
        assert_eq!(labels, vec!["Google", "Affiliate", "(empty)"]);
        assert_eq!(tree.rows[0].children.len(), 2);
        assert_eq!(tree.rows[0].subtotals[0], Some(8.0));
        assert_eq!(tree.grand_totals()[0], Some(11.0));
        assert_eq!(tree.rows[0].leaf_count(), 2);
    }

    #[test]
    fn leaf_cells_index_perpendicular_paths() {
        let result = small_result();
        let tree = build_tree(&result, &keys(&["SOURCE"]), &keys(&["CATEGORY"]), &keys(&["count"])).unwrap();
        let google = &tree.rows[0];
        assert!(google.is_leaf());
        let gizmo = DimensionPath::from_values(["Gizmo"]);
        assert_eq!(google.cell_values.get(&gizmo).unwrap()[0], Some(5.0));
        assert_eq!(tree.columns[0].subtotals[0], Some(6.0));
        assert_eq!(
            tree.aggregates.value(&DimensionPath::from_values(["Affiliate"]), &gizmo, 0),
            None
        );
    }

    #[test]
    fn duplicate_leaf_rows_keep_the_first() {
        let mut result = small_result();
        result.push_row(vec!["Google".into(), "Gizmo".into(), 40.0.into()]);
        let tree = build_tree(&result, &keys(&["SOURCE", "CATEGORY"]), &[], &keys(&["count"])).unwrap();
        let google = &tree.rows[0];
        assert_eq!(google.children.len(), 2);
        let leaves: f64 = google.children.iter().filter_map(|c| c.subtotals[0]).sum();
        assert_eq!(google.children[0].subtotals[0], Some(5.0));
        assert_eq!(google.subtotals[0], Some(leaves));
        assert_eq!(tree.grand_totals()[0], Some(11.0));
    }

    #[test]
    fn non_derivable_measures_use_supplied_subtotals() {
        let mut result = QueryResult::new(vec![
            ResultColumn::dimension("SOURCE", "Source"),
            ResultColumn::dimension("CATEGORY", "Category"),
            ResultColumn::measure("avg", "Average", AggregationKind::Average),
            ResultColumn::pivot_grouping(),
        ]);
        result.push_row(vec!["Google".into(), "Gizmo".into(), 10.0.into(), 0i64.into()]);
        result.push_row(vec!["Google".into(), "Widget".into(), 20.0.into(), 0i64.into()]);
        result.push_row(vec!["Affiliate".into(), "Widget".into(), 30.0.into(), 0i64.into()]);
        // CATEGORY (bit 1) rolled up: per-source average.
        result.push_row(vec!["Google".into(), DimensionValue::Null, 12.5.into(), 2i64.into()]);
        // Everything rolled up.
        result.push_row(vec![DimensionValue::Null, DimensionValue::Null, 17.0.into(), 3i64.into()]);

        let tree = build_tree(&result, &keys(&["SOURCE", "CATEGORY"]), &[], &keys(&["avg"])).unwrap();
        assert_eq!(tree.rows.len(), 2);
        assert_eq!(tree.rows[0].subtotals[0], Some(12.5));
        // No supplied subtotal and not derivable.
        assert_eq!(tree.rows[1].subtotals[0], None);
        assert_eq!(tree.grand_totals()[0], Some(17.0));
        assert_eq!(tree.rows[0].children[1].subtotals[0], Some(20.0));
    }

    #[test]
    fn derivable_min_and_max() {
        let mut result = QueryResult::new(vec![
            ResultColumn::dimension("SOURCE", "Source"),
            ResultColumn::dimension("CATEGORY", "Category"),
            ResultColumn::measure("min", "Min", AggregationKind::Min),
            ResultColumn::measure("max", "Max", AggregationKind::Max),
        ]);
        result.push_row(vec!["Google".into(), "Gizmo".into(), 4.0.into(), 9.0.into()]);
        result.push_row(vec!["Google".into(), "Widget".into(), 2.0.into(), 7.0.into()]);
        let tree = build_tree(&result, &keys(&["SOURCE", "CATEGORY"]), &[], &keys(&["min", "max"])).unwrap();
        assert_eq!(tree.rows[0].subtotals.as_slice(), &[Some(2.0), Some(9.0)]);
    }

    #[test]
    fn sort_by_measure_reorders_siblings() {
        let result = small_result();
        let sorts = vec![SortDirective::by_measure("SOURCE", "count", SortDirection::Ascending)];
        let dims = keys(&["SOURCE", "CATEGORY"]);
        let measures = keys(&["count"]);
        let tree = TreeBuilder::new(&result, &dims, &[], &measures)
            .with_sorts(&sorts)
            .build()
            .unwrap();
        let labels: Vec<String> = tree.rows.iter().map(|n| n.label()).collect();
        assert_eq!(labels, vec!["(empty)", "Affiliate", "Google"]);

        let by_value = vec![SortDirective::by_value("CATEGORY", SortDirection::Descending)];
        let tree = TreeBuilder::new(&result, &dims, &[], &measures)
            .with_sorts(&by_value)
            .build()
            .unwrap();
        let google: Vec<String> = tree.rows[0].children.iter().map(|n| n.label()).collect();
        assert_eq!(google, vec!["Widget", "Gizmo"]);
    }

    #[test]
    fn rejects_bad_input() {
        let result = small_result();
        assert_eq!(
            build_tree(&result, &keys(&["NOPE"]), &[], &keys(&["count"])).unwrap_err(),
            PivotError::UnknownDimensionInSettings { key: "NOPE".into() }
        );
        assert_eq!(
            build_tree(&result, &keys(&["SOURCE"]), &[], &keys(&["CATEGORY"])).unwrap_err(),
            PivotError::UnknownMeasure { key: "CATEGORY".into() }
        );
        assert_eq!(
            build_tree(&result, &keys(&["SOURCE"]), &keys(&["SOURCE"]), &keys(&["count"])).unwrap_err(),
            PivotError::DuplicateDimension { key: "SOURCE".into() }
        );

        let mut short = small_result();
        short.rows.push(vec!["Google".into()]);
        assert_eq!(
            build_tree(&short, &keys(&["SOURCE", "CATEGORY"]), &[], &keys(&["count"])).unwrap_err(),
            PivotError::MissingColumn { row: 4, key: "CATEGORY".into() }
        );

        let flat = QueryResult::new(vec![ResultColumn::dimension("ID", "ID")]);
        assert_eq!(
            build_tree(&flat, &keys(&["ID"]), &[], &[]).unwrap_err(),
            PivotError::UnaggregatedQuery
        );
    }

    #[test]
    fn empty_result_builds_empty_tree() {
        let result = QueryResult::new(small_result().columns);
        let tree = build_tree(&result, &keys(&["SOURCE"]), &keys(&["CATEGORY"]), &keys(&["count"])).unwrap();
        assert!(tree.rows.is_empty());
        assert!(tree.columns.is_empty());
        assert_eq!(tree.grand_totals().as_slice(), &[None]);
    }
}
