//! FILENAME: core/engine/src/result.rs
//! PURPOSE: The grouped query-result contract consumed by the pivot engine.
//! CONTEXT: A result is an ordered list of rows, each already aggregated at the
//! query's grouping granularity. Columns declare whether they are a breakout
//! dimension, an aggregated measure, or the pivot-grouping bitmask that marks
//! upstream subtotal rows.

use serde::{Deserialize, Serialize};
use crate::value::DimensionValue;

// ============================================================================
// AGGREGATION
// ============================================================================

/// The aggregation an upstream query applied to produce a measure column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationKind {
    Count,
    Sum,
    Min,
    Max,
    Average,
    Distinct,
    Median,
    StdDev,
    CumulativeSum,
    CumulativeCount,
    Other,
}

impl Default for AggregationKind {
    fn default() -> Self {
        AggregationKind::Count
    }
}

impl AggregationKind {
    /// Whether a subtotal can be re-derived from finer-grained values of the
    /// same measure without asking the query layer again.
    pub fn is_derivable(self) -> bool {
        matches!(
            self,
            AggregationKind::Count | AggregationKind::Sum | AggregationKind::Min | AggregationKind::Max
        )
    }
}

// ============================================================================
// COLUMNS
// ============================================================================

/// What a result column carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ColumnRole {
    /// A breakout (grouping) dimension.
    Dimension,
    /// An aggregated measure.
    Measure { aggregation: AggregationKind },
    /// Bitmask of rolled-up breakouts; bit `i` set means breakout `i`
    /// (in breakout order) is aggregated away in that row.
    PivotGrouping,
}

/// One column of a grouped query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultColumn {
    /// Stable key used by visualization settings (e.g. "SOURCE", "count").
    pub key: String,

    /// Human-readable name (e.g. "User → Source").
    pub display_name: String,

    pub role: ColumnRole,
}

impl ResultColumn {
    pub fn dimension(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        ResultColumn {
            key: key.into(),
            display_name: display_name.into(),
            role: ColumnRole::Dimension,
        }
    }

    pub fn measure(
        key: impl Into<String>,
        display_name: impl Into<String>,
        aggregation: AggregationKind,
    ) -> Self {
        ResultColumn {
            key: key.into(),
            display_name: display_name.into(),
            role: ColumnRole::Measure { aggregation },
        }
    }

    pub fn pivot_grouping() -> Self {
        ResultColumn {
            key: PIVOT_GROUPING_KEY.to_string(),
            display_name: PIVOT_GROUPING_KEY.to_string(),
            role: ColumnRole::PivotGrouping,
        }
    }

    pub fn is_dimension(&self) -> bool {
        matches!(self.role, ColumnRole::Dimension)
    }

    pub fn is_measure(&self) -> bool {
        matches!(self.role, ColumnRole::Measure { .. })
    }

    pub fn aggregation(&self) -> Option<AggregationKind> {
        match self.role {
            ColumnRole::Measure { aggregation } => Some(aggregation),
            _ => None,
        }
    }
}

/// Conventional key of the pivot-grouping column.
pub const PIVOT_GROUPING_KEY: &str = "pivot-grouping";

// ============================================================================
// RESULT SET
// ============================================================================

/// An ordered, already-aggregated result set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<ResultColumn>,

    /// Row values, positionally aligned with `columns`.
    pub rows: Vec<Vec<DimensionValue>>,
}

impl QueryResult {
    pub fn new(columns: Vec<ResultColumn>) -> Self {
        QueryResult {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row. Short rows are padded with nulls.
    pub fn push_row(&mut self, mut values: Vec<DimensionValue>) {
        while values.len() < self.columns.len() {
            values.push(DimensionValue::Null);
        }
        self.rows.push(values);
    }

    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    pub fn column(&self, key: &str) -> Option<&ResultColumn> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Breakout dimension keys, in breakout order.
    pub fn dimension_keys(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_dimension())
            .map(|c| c.key.clone())
            .collect()
    }

    /// Measure keys, in result order.
    pub fn measure_keys(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_measure())
            .map(|c| c.key.clone())
            .collect()
    }

    /// Position of the pivot-grouping column, if the query produced one.
    pub fn grouping_index(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| matches!(c.role, ColumnRole::PivotGrouping))
    }

    /// A pivot needs at least one breakout and at least one aggregation.
    pub fn is_aggregated(&self) -> bool {
        self.columns.iter().any(|c| c.is_dimension()) && self.columns.iter().any(|c| c.is_measure())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QueryResult {
        let mut result = QueryResult::new(vec![
            ResultColumn::dimension("SOURCE", "User → Source"),
            ResultColumn::dimension("CATEGORY", "Product → Category"),
            ResultColumn::measure("count", "Count", AggregationKind::Count),
        ]);
        result.push_row(vec!["Affiliate".into(), "Doohickey".into(), 899.0.into()]);
        result
    }

    #[test]
    fn exposes_dimensions_and_measures() {
        let result = sample();
        assert_eq!(result.dimension_keys(), vec!["SOURCE", "CATEGORY"]);
        assert_eq!(result.measure_keys(), vec!["count"]);
        assert!(result.is_aggregated());
        assert_eq!(result.grouping_index(), None);
    }

    #[test]
    fn flat_query_is_not_aggregated() {
        let result = QueryResult::new(vec![ResultColumn::dimension("ID", "ID")]);
        assert!(!result.is_aggregated());
    }

    #[test]
    fn short_rows_are_padded() {
        let mut result = sample();
        result.push_row(vec!["Google".into()]);
        assert_eq!(result.rows[1].len(), 3);
        assert!(result.rows[1][2].is_null());
    }

    #[test]
    fn derivable_aggregations() {
        assert!(AggregationKind::Sum.is_derivable());
        assert!(AggregationKind::Count.is_derivable());
        assert!(!AggregationKind::Average.is_derivable());
        assert!(!AggregationKind::Distinct.is_derivable());
    }
}
