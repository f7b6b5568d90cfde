//! FILENAME: core/persistence/src/settings.rs
//! Persisted visualization settings for a pivot table.
//!
//! The settings object is a flat map of dotted keys. Only the keys the pivot
//! engine understands are typed here; every other key is kept in `other` and
//! written back unchanged.

use std::collections::BTreeMap;

use pivot_engine::{ColumnSplit, ColumnWidths, DimensionKey, MeasureKey, SortDirection};
use serde::{Deserialize, Serialize};

// ============================================================================
// COLLAPSED ENTRIES
// ============================================================================

/// Collapsed groups of one axis.
///
/// Each `value` entry is either a JSON path such as `["Affiliate"]`, naming
/// one group, or a bare level index such as `1`, naming every group of the
/// dimension at that position in `rows`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapsedEntries {
    #[serde(default)]
    pub value: Vec<String>,

    /// Axis dimensions the entries were recorded against.
    #[serde(default)]
    pub rows: Vec<DimensionKey>,

    /// Paths re-expanded inside a collapsed level.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expanded: Vec<String>,
}

impl CollapsedEntries {
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.expanded.is_empty()
    }
}

/// One sort-by-measure entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureSort {
    pub dimension: DimensionKey,
    pub measure: MeasureKey,
    pub direction: SortDirection,
}

// ============================================================================
// VISUALIZATION SETTINGS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationSettings {
    #[serde(
        rename = "pivot_table.column_split",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub column_split: Option<ColumnSplit>,

    #[serde(
        rename = "pivot_table.collapsed_rows",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub collapsed_rows: Option<CollapsedEntries>,

    #[serde(
        rename = "pivot_table.collapsed_columns",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub collapsed_columns: Option<CollapsedEntries>,

    #[serde(
        rename = "pivot_table.column_show_totals",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub column_show_totals: Option<BTreeMap<DimensionKey, bool>>,

    #[serde(
        rename = "pivot_table.column_sort_order",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub column_sort_order: Option<BTreeMap<DimensionKey, SortDirection>>,

    #[serde(
        rename = "pivot_table.measure_sort",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub measure_sort: Option<Vec<MeasureSort>>,

    /// The "Row totals" column at the right edge.
    #[serde(
        rename = "pivot.show_row_totals",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub show_row_totals: Option<bool>,

    /// The "Grand totals" row at the bottom.
    #[serde(
        rename = "pivot.show_column_totals",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub show_column_totals: Option<bool>,

    #[serde(
        rename = "pivot_table.column_widths",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub column_widths: Option<ColumnWidths>,

    /// Keys this crate does not interpret.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl VisualizationSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column_split(mut self, split: ColumnSplit) -> Self {
        self.column_split = Some(split);
        self
    }

    pub fn with_collapsed_rows(mut self, entries: CollapsedEntries) -> Self {
        self.collapsed_rows = Some(entries);
        self
    }

    pub fn with_show_totals(mut self, dimension: &str, enabled: bool) -> Self {
        self.column_show_totals
            .get_or_insert_with(BTreeMap::new)
            .insert(dimension.to_string(), enabled);
        self
    }
}
