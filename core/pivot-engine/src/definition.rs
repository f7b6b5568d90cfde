//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a pivot over a
//! grouped query result. These structures are designed to be:
//! - Serializable (for saving/loading visualization settings)
//! - Immutable snapshots of user intent: every edit produces a new value

use engine::NumberFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::collapse::CollapseState;
use crate::error::{PivotError, PivotResult};
use crate::log_debug;

/// Unique identifier for a pivot within its host.
pub type PivotId = u32;

/// Key of a breakout column in the query result.
pub type DimensionKey = String;

/// Key of an aggregated column in the query result.
pub type MeasureKey = String;

// ============================================================================
// AXES
// ============================================================================

/// One of the two header hierarchies of the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    pub fn perpendicular(self) -> Axis {
        match self {
            Axis::Row => Axis::Column,
            Axis::Column => Axis::Row,
        }
    }

    /// Label of the grand total item on this axis.
    pub fn grand_total_label(self) -> &'static str {
        match self {
            Axis::Row => "Grand totals",
            Axis::Column => "Row totals",
        }
    }
}

/// Assignment of query dimensions to axes, plus the measures to display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSplit {
    /// Row-axis dimensions, outermost first.
    #[serde(default)]
    pub rows: Vec<DimensionKey>,

    /// Column-axis dimensions, outermost first.
    #[serde(default)]
    pub columns: Vec<DimensionKey>,

    /// Measures in display order. Empty means every measure of the result.
    #[serde(default)]
    pub values: Vec<MeasureKey>,
}

impl ColumnSplit {
    pub fn new<R, C, V>(rows: R, columns: C, values: V) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        ColumnSplit {
            rows: rows.into_iter().map(Into::into).collect(),
            columns: columns.into_iter().map(Into::into).collect(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Default assignment: every dimension but the last on rows, the last on
    /// columns. A single dimension goes to rows.
    pub fn default_for(dimensions: &[DimensionKey], measures: &[MeasureKey]) -> Self {
        let (rows, columns) = match dimensions.len() {
            0 => (Vec::new(), Vec::new()),
            1 => (dimensions.to_vec(), Vec::new()),
            n => (dimensions[..n - 1].to_vec(), vec![dimensions[n - 1].clone()]),
        };
        ColumnSplit {
            rows,
            columns,
            values: measures.to_vec(),
        }
    }

    pub fn dimensions(&self, axis: Axis) -> &[DimensionKey] {
        match axis {
            Axis::Row => &self.rows,
            Axis::Column => &self.columns,
        }
    }

    pub fn axis_of(&self, key: &str) -> Option<Axis> {
        if self.rows.iter().any(|k| k == key) {
            Some(Axis::Row)
        } else if self.columns.iter().any(|k| k == key) {
            Some(Axis::Column)
        } else {
            None
        }
    }

    /// Measures to display, resolving an empty list to every measure.
    pub fn resolved_values(&self, measures: &[MeasureKey]) -> Vec<MeasureKey> {
        if self.values.is_empty() {
            measures.to_vec()
        } else {
            self.values.clone()
        }
    }

    /// Checks the split against the dimensions and measures of a result.
    /// Every query dimension must sit on exactly one axis.
    pub fn validate(&self, dimensions: &[DimensionKey], measures: &[MeasureKey]) -> PivotResult<()> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.rows.len() + self.columns.len());
        for key in self.rows.iter().chain(self.columns.iter()) {
            if !dimensions.iter().any(|d| d == key) {
                return Err(PivotError::UnknownDimensionInSettings { key: key.clone() });
            }
            if seen.contains(&key.as_str()) {
                return Err(PivotError::DuplicateDimension { key: key.clone() });
            }
            seen.push(key);
        }
        if let Some(missing) = dimensions.iter().find(|d| !seen.contains(&d.as_str())) {
            return Err(PivotError::UnknownDimensionInSettings { key: missing.clone() });
        }
        if let Some(unknown) = self.values.iter().find(|m| !measures.contains(m)) {
            return Err(PivotError::UnknownMeasure { key: unknown.clone() });
        }
        Ok(())
    }
}

// ============================================================================
// TOTALS
// ============================================================================

/// Per-dimension subtotal switch. Dimensions not listed show totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowTotals(BTreeMap<DimensionKey, bool>);

impl ShowTotals {
    pub fn is_enabled(&self, key: &str) -> bool {
        self.0.get(key).copied().unwrap_or(true)
    }

    /// Returns a copy with the switch for `key` set.
    pub fn with(&self, key: &str, enabled: bool) -> Self {
        let mut next = self.clone();
        next.0.insert(key.to_string(), enabled);
        next
    }

    pub fn entries(&self) -> &BTreeMap<DimensionKey, bool> {
        &self.0
    }
}

impl From<BTreeMap<DimensionKey, bool>> for ShowTotals {
    fn from(map: BTreeMap<DimensionKey, bool>) -> Self {
        ShowTotals(map)
    }
}

/// Grand total switches, one per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotLayout {
    /// Show the grand total row at the end of the row axis.
    pub show_row_grand_totals: bool,

    /// Show the grand total column at the end of the column axis.
    pub show_column_grand_totals: bool,
}

impl Default for PivotLayout {
    fn default() -> Self {
        PivotLayout {
            show_row_grand_totals: true,
            show_column_grand_totals: true,
        }
    }
}

impl PivotLayout {
    pub fn shows_grand_total(&self, axis: Axis) -> bool {
        match axis {
            Axis::Row => self.show_row_grand_totals,
            Axis::Column => self.show_column_grand_totals,
        }
    }
}

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Ascending
    }
}

/// What the siblings of a dimension are ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "by", content = "key")]
pub enum SortBy {
    /// The dimension values themselves.
    Value,
    /// The subtotal of a measure for each sibling.
    Measure(MeasureKey),
}

/// Reorders the siblings of one dimension at every place it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    pub dimension: DimensionKey,
    pub by: SortBy,
    pub direction: SortDirection,
}

impl SortDirective {
    pub fn by_value(dimension: impl Into<String>, direction: SortDirection) -> Self {
        SortDirective {
            dimension: dimension.into(),
            by: SortBy::Value,
            direction,
        }
    }

    pub fn by_measure(
        dimension: impl Into<String>,
        measure: impl Into<String>,
        direction: SortDirection,
    ) -> Self {
        SortDirective {
            dimension: dimension.into(),
            by: SortBy::Measure(measure.into()),
            direction,
        }
    }
}

// ============================================================================
// PRESENTATION
// ============================================================================

/// Persisted header widths. Opaque to the engine apart from width hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnWidths {
    #[serde(default)]
    pub left_header_widths: Vec<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_left_header_widths: Option<u32>,

    /// Keyed by data column index, as text.
    #[serde(default)]
    pub value_header_widths: BTreeMap<String, u32>,
}

impl ColumnWidths {
    pub fn left_header(&self, index: usize) -> Option<u32> {
        self.left_header_widths.get(index).copied()
    }

    pub fn value_header(&self, index: usize) -> Option<u32> {
        self.value_header_widths.get(&index.to_string()).copied()
    }
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// The complete, serializable definition of a pivot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotDefinition {
    /// Unique identifier for this pivot.
    pub id: PivotId,

    /// Version for cache invalidation.
    pub version: u64,

    pub split: ColumnSplit,

    #[serde(default)]
    pub show_totals: ShowTotals,

    #[serde(default)]
    pub collapse: CollapseState,

    #[serde(default)]
    pub layout: PivotLayout,

    #[serde(default)]
    pub sorts: Vec<SortDirective>,

    #[serde(default)]
    pub column_widths: ColumnWidths,

    /// Display format per measure; measures not listed use the grouped format.
    #[serde(default)]
    pub number_formats: BTreeMap<MeasureKey, NumberFormat>,
}

impl PivotDefinition {
    pub fn new(id: PivotId, split: ColumnSplit) -> Self {
        let collapse = CollapseState::new(&split.rows, &split.columns);
        PivotDefinition {
            id,
            split,
            collapse,
            ..Default::default()
        }
    }

    /// Increments the version (for cache invalidation).
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    pub fn dimensions(&self, axis: Axis) -> &[DimensionKey] {
        self.split.dimensions(axis)
    }

    pub fn number_format(&self, measure: &str) -> NumberFormat {
        self.number_formats.get(measure).cloned().unwrap_or_default()
    }

    /// Collapse state bound to the current split.
    pub fn bound_collapse(&self) -> CollapseState {
        self.collapse
            .reconcile(Axis::Row, &self.split.rows)
            .reconcile(Axis::Column, &self.split.columns)
    }

    /// Returns a new definition with the group at `path` toggled.
    pub fn toggle_collapse(&self, axis: Axis, path: &crate::path::DimensionPath) -> Self {
        let mut next = self.clone();
        next.collapse = self.bound_collapse().toggle(axis, path);
        next.bump_version();
        next
    }

    /// Returns a new definition with every group of `dimension` toggled.
    pub fn toggle_level(&self, axis: Axis, dimension: &str) -> Self {
        let mut next = self.clone();
        next.collapse = self.bound_collapse().toggle_level(axis, dimension);
        next.bump_version();
        next
    }

    /// Returns a new definition with the subtotal switch for `key` set.
    pub fn with_show_totals(&self, key: &str, enabled: bool) -> Self {
        let mut next = self.clone();
        next.show_totals = self.show_totals.with(key, enabled);
        next.bump_version();
        next
    }

    /// Returns a new definition using `split`. Collapse entries whose path is
    /// no longer meaningful under the new axis dimensions are dropped, sort
    /// directives on dimensions no longer placed are dropped, and subtotal
    /// switches are kept as they are keyed by dimension.
    pub fn reassign(&self, split: ColumnSplit) -> Self {
        let collapse = self
            .collapse
            .reconcile(Axis::Row, &split.rows)
            .reconcile(Axis::Column, &split.columns);

        let sorts: Vec<SortDirective> = self
            .sorts
            .iter()
            .filter(|sort| {
                let placed = split.axis_of(&sort.dimension).is_some();
                let measure_ok = match &sort.by {
                    SortBy::Measure(m) => split.values.is_empty() || split.values.contains(m),
                    SortBy::Value => true,
                };
                if !(placed && measure_ok) {
                    log_debug!(
                        "PIVOT",
                        "dropping sort on {} after axis reassignment",
                        sort.dimension
                    );
                }
                placed && measure_ok
            })
            .cloned()
            .collect();

        let mut next = self.clone();
        next.split = split;
        next.collapse = collapse;
        next.sorts = sorts;
        next.bump_version();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::DimensionPath;

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn toggles_bind_a_default_collapse_state() {
        let def = PivotDefinition {
            split: ColumnSplit::new(["SOURCE", "CATEGORY"], Vec::<String>::new(), ["count"]),
            ..Default::default()
        };
        let affiliate = DimensionPath::from_values(["Affiliate"]);
        let google = DimensionPath::from_values(["Google"]);

        let level = def.toggle_level(Axis::Row, "SOURCE");
        assert_eq!(level.collapse.rows.dimensions, keys(&["SOURCE", "CATEGORY"]));
        assert!(level.collapse.is_collapsed(Axis::Row, &affiliate));

        let opened = level.toggle_collapse(Axis::Row, &affiliate);
        assert!(!opened.collapse.is_collapsed(Axis::Row, &affiliate));
        assert!(opened.collapse.is_collapsed(Axis::Row, &google));
        assert_eq!(opened.version, 2);
    }

    #[test]
    fn default_split_puts_last_dimension_on_columns() {
        let split = ColumnSplit::default_for(&keys(&["SOURCE", "CATEGORY"]), &keys(&["count"]));
        assert_eq!(split.rows, keys(&["SOURCE"]));
        assert_eq!(split.columns, keys(&["CATEGORY"]));
        assert_eq!(split.values, keys(&["count"]));

        let single = ColumnSplit::default_for(&keys(&["SOURCE"]), &[]);
        assert_eq!(single.rows, keys(&["SOURCE"]));
        assert!(single.columns.is_empty());
    }

    #[test]
    fn validate_rejects_unknown_duplicate_and_unassigned() {
        let dims = keys(&["SOURCE", "CATEGORY"]);
        let measures = keys(&["count"]);

        let unknown = ColumnSplit::new(["SOURCE", "NOPE"], ["CATEGORY"], Vec::<String>::new());
        assert_eq!(
            unknown.validate(&dims, &measures),
            Err(PivotError::UnknownDimensionInSettings { key: "NOPE".into() })
        );

        let duplicate = ColumnSplit::new(["SOURCE"], ["SOURCE", "CATEGORY"], Vec::<String>::new());
        assert_eq!(
            duplicate.validate(&dims, &measures),
            Err(PivotError::DuplicateDimension { key: "SOURCE".into() })
        );

        let unassigned = ColumnSplit::new(["SOURCE"], Vec::<String>::new(), Vec::<String>::new());
        assert!(unassigned.validate(&dims, &measures).is_err());

        let bad_measure = ColumnSplit::new(["SOURCE"], ["CATEGORY"], ["sum"]);
        assert_eq!(
            bad_measure.validate(&dims, &measures),
            Err(PivotError::UnknownMeasure { key: "sum".into() })
        );

        let ok = ColumnSplit::new(["CATEGORY"], ["SOURCE"], Vec::<String>::new());
        assert!(ok.validate(&dims, &measures).is_ok());
        assert_eq!(ok.resolved_values(&measures), measures);
    }

    #[test]
    fn show_totals_defaults_to_enabled() {
        let totals = ShowTotals::default();
        assert!(totals.is_enabled("SOURCE"));
        let off = totals.with("SOURCE", false);
        assert!(!off.is_enabled("SOURCE"));
        assert!(totals.is_enabled("SOURCE"));
    }

    #[test]
    fn toggle_collapse_returns_new_snapshot() {
        let def = PivotDefinition::new(1, ColumnSplit::new(["SOURCE", "CATEGORY"], Vec::<String>::new(), ["count"]));
        let path = DimensionPath::from_values(["Google"]);
        let next = def.toggle_collapse(Axis::Row, &path);
        assert!(!def.collapse.is_collapsed(Axis::Row, &path));
        assert!(next.collapse.is_collapsed(Axis::Row, &path));
        assert_eq!(next.version, def.version + 1);
    }

    #[test]
    fn reassign_keeps_totals_and_drops_orphan_sorts() {
        let mut def = PivotDefinition::new(7, ColumnSplit::new(["SOURCE"], ["CATEGORY"], ["count"]));
        def.sorts.push(SortDirective::by_value("CATEGORY", SortDirection::Descending));
        def.sorts.push(SortDirective::by_measure("SOURCE", "count", SortDirection::Ascending));
        let def = def.with_show_totals("SOURCE", false);

        let next = def.reassign(ColumnSplit::new(["SOURCE"], Vec::<String>::new(), ["count"]));
        assert!(!next.show_totals.is_enabled("SOURCE"));
        assert_eq!(next.sorts.len(), 1);
        assert_eq!(next.sorts[0].dimension, "SOURCE");
    }

    #[test]
    fn serde_shapes() {
        let sort = SortDirective::by_measure("SOURCE", "count", SortDirection::Descending);
        let json = serde_json::to_value(&sort).unwrap();
        assert_eq!(json["by"]["by"], "measure");
        assert_eq!(json["by"]["key"], "count");
        assert_eq!(json["direction"], "descending");

        let widths: ColumnWidths = serde_json::from_str(
            r#"{"leftHeaderWidths":[80],"totalLeftHeaderWidths":80,"valueHeaderWidths":{"1":120}}"#,
        )
        .unwrap();
        assert_eq!(widths.left_header(0), Some(80));
        assert_eq!(widths.value_header(1), Some(120));
        assert_eq!(widths.value_header(0), None);
    }
}
