//! FILENAME: core/pivot-engine/src/view.rs
//! Pivot View - Renderable output for the host.
//!
//! This module describes the 2D grid produced from the projected axes.
//! It includes metadata for:
//! - Expand/collapse affordances on headers and subtotal lines
//! - Row/column headers with nesting levels
//! - Cell types (data, subtotal, grand total)
//! - Drill-through filters for every data cell

use engine::DimensionValue;
use serde::{Deserialize, Serialize};

use crate::definition::{Axis, DimensionKey, MeasureKey, PivotId};
use crate::path::DimensionPath;

// ============================================================================
// CELL TYPES AND METADATA
// ============================================================================

/// The type of a cell in the pivot view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotCellType {
    /// Top-left area; holds row dimension names in the last header row.
    Corner,
    RowHeader,
    ColumnHeader,
    Data,
    RowSubtotal,
    ColumnSubtotal,
    GrandTotalRow,
    GrandTotalColumn,
    /// Intersection of the row and column grand totals.
    GrandTotal,
    Blank,
}

/// Display value for a pivot cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PivotCellValue {
    Empty,
    Number(f64),
    Text(String),
}

/// One dimension constraint identifying a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionFilter {
    pub dimension: DimensionKey,
    pub value: DimensionValue,
}

/// What clicking a header's expand/collapse affordance toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CollapseTarget {
    Group { axis: Axis, path: DimensionPath },
    Level { axis: Axis, dimension: DimensionKey },
}

// ============================================================================
// VIEW CELL
// ============================================================================

/// A single cell in the pivot view: value plus rendering metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotViewCell {
    pub value: PivotCellValue,

    pub cell_type: PivotCellType,

    /// Nesting level of the header this cell belongs to.
    pub indent_level: u8,

    /// Whether this cell's group is collapsed.
    pub is_collapsed: bool,

    /// Whether this cell can be expanded/collapsed.
    pub is_expandable: bool,

    pub collapse_target: Option<CollapseTarget>,

    /// Whether this cell should be visually emphasized (e.g., totals).
    pub is_bold: bool,

    pub background_style: BackgroundStyle,

    /// Filters identifying the row and column groups of this cell.
    pub group_path: Vec<DimensionFilter>,

    /// Pre-formatted display string.
    pub formatted_value: String,
}

impl PivotViewCell {
    fn with_type(value: PivotCellValue, cell_type: PivotCellType, formatted_value: String) -> Self {
        PivotViewCell {
            value,
            cell_type,
            indent_level: 0,
            is_collapsed: false,
            is_expandable: false,
            collapse_target: None,
            is_bold: false,
            background_style: BackgroundStyle::Normal,
            group_path: Vec::new(),
            formatted_value,
        }
    }

    /// A data cell. A missing value renders blank.
    pub fn data(value: Option<f64>, formatted: String) -> Self {
        match value {
            Some(n) => Self::with_type(PivotCellValue::Number(n), PivotCellType::Data, formatted),
            None => Self::with_type(PivotCellValue::Empty, PivotCellType::Data, String::new()),
        }
    }

    pub fn row_header(label: String, indent: u8) -> Self {
        let mut cell = Self::with_type(
            PivotCellValue::Text(label.clone()),
            PivotCellType::RowHeader,
            label,
        );
        cell.indent_level = indent;
        cell.background_style = BackgroundStyle::Header;
        cell
    }

    pub fn column_header(label: String) -> Self {
        let mut cell = Self::with_type(
            PivotCellValue::Text(label.clone()),
            PivotCellType::ColumnHeader,
            label,
        );
        cell.is_bold = true;
        cell.background_style = BackgroundStyle::Header;
        cell
    }

    pub fn corner(label: Option<String>) -> Self {
        let mut cell = match label {
            Some(text) => Self::with_type(PivotCellValue::Text(text.clone()), PivotCellType::Corner, text),
            None => Self::with_type(PivotCellValue::Empty, PivotCellType::Corner, String::new()),
        };
        cell.background_style = BackgroundStyle::Header;
        cell
    }

    pub fn blank() -> Self {
        Self::with_type(PivotCellValue::Empty, PivotCellType::Blank, String::new())
    }

    pub fn with_cell_type(mut self, cell_type: PivotCellType) -> Self {
        self.cell_type = cell_type;
        self
    }

    /// Attaches an expand/collapse affordance.
    pub fn with_toggle(mut self, target: CollapseTarget, collapsed: bool) -> Self {
        self.is_expandable = true;
        self.is_collapsed = collapsed;
        self.collapse_target = Some(target);
        self
    }

    /// Sets cell as a total.
    pub fn as_total(mut self, style: BackgroundStyle) -> Self {
        self.is_bold = true;
        self.background_style = style;
        self
    }

    pub fn with_group_path(mut self, path: Vec<DimensionFilter>) -> Self {
        self.group_path = path;
        self
    }
}

/// Background style hints for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgroundStyle {
    Normal,
    Header,
    Subtotal,
    GrandTotal,
}

impl Default for BackgroundStyle {
    fn default() -> Self {
        BackgroundStyle::Normal
    }
}

// ============================================================================
// ROW AND COLUMN DESCRIPTORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRowDescriptor {
    pub view_row: usize,

    pub row_type: PivotRowType,

    /// Nesting depth (0 = outermost).
    pub depth: u8,

    /// Row-axis group of this row; empty for header and grand total rows.
    pub path: DimensionPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotRowType {
    Data,
    Subtotal,
    GrandTotal,
    ColumnHeader,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotColumnDescriptor {
    pub view_col: usize,

    pub col_type: PivotColumnType,

    /// Nesting depth (0 = outermost).
    pub depth: u8,

    /// Width hint in pixels.
    pub width_hint: u32,

    /// Column-axis group of this column; empty for labels and grand totals.
    pub path: DimensionPath,

    /// Measure shown in this column (data columns only).
    pub measure: Option<MeasureKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotColumnType {
    /// Row label column(s) - left side.
    RowLabel,
    Data,
    Subtotal,
    GrandTotal,
}

// ============================================================================
// MAIN VIEW STRUCT
// ============================================================================

/// The complete rendered view of a pivot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotView {
    pub pivot_id: PivotId,

    /// Indexed as cells[row][col].
    pub cells: Vec<Vec<PivotViewCell>>,

    pub rows: Vec<PivotRowDescriptor>,

    pub columns: Vec<PivotColumnDescriptor>,

    pub row_count: usize,

    pub col_count: usize,

    /// Number of row label columns (left frozen area).
    pub row_label_col_count: usize,

    /// Number of column header rows (top frozen area).
    pub column_header_row_count: usize,

    /// Version for cache coherency with the host.
    pub version: u64,
}

impl PivotView {
    pub fn new(pivot_id: PivotId) -> Self {
        PivotView {
            pivot_id,
            cells: Vec::new(),
            rows: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
            col_count: 0,
            row_label_col_count: 0,
            column_header_row_count: 0,
            version: 0,
        }
    }

    pub fn get_cell(&self, row: usize, col: usize) -> Option<&PivotViewCell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    pub fn add_row(&mut self, cells: Vec<PivotViewCell>, descriptor: PivotRowDescriptor) {
        self.cells.push(cells);
        self.rows.push(descriptor);
        self.row_count = self.cells.len();
    }

    pub fn set_columns(&mut self, columns: Vec<PivotColumnDescriptor>) {
        self.col_count = columns.len();
        self.columns = columns;
    }

    /// Number of rows below the column headers.
    pub fn body_row_count(&self) -> usize {
        self.row_count.saturating_sub(self.column_header_row_count)
    }

    /// Formatted text of every cell, row by row.
    pub fn text_grid(&self) -> Vec<Vec<String>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.formatted_value.clone()).collect())
            .collect()
    }

    /// Positions of every cell whose formatted text equals `text`.
    pub fn find_text(&self, text: &str) -> Vec<(usize, usize)> {
        let mut found = Vec::new();
        for (r, row) in self.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if cell.formatted_value == text {
                    found.push((r, c));
                }
            }
        }
        found
    }
}

// ============================================================================
// DRILL-THROUGH
// ============================================================================

/// Filters for the underlying records behind one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillThrough {
    pub pivot_id: PivotId,

    /// One filter per dimension fixed by the cell's row and column groups.
    pub filters: Vec<DimensionFilter>,

    pub measure: Option<MeasureKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_row(view_row: usize) -> PivotRowDescriptor {
        PivotRowDescriptor {
            view_row,
            row_type: PivotRowType::ColumnHeader,
            depth: 0,
            path: DimensionPath::root(),
        }
    }

    fn data_row(view_row: usize) -> PivotRowDescriptor {
        PivotRowDescriptor {
            view_row,
            row_type: PivotRowType::Data,
            depth: 0,
            path: DimensionPath::root(),
        }
    }

    #[test]
    fn data_cell_without_value_is_blank() {
        let cell = PivotViewCell::data(None, "ignored".into());
        assert_eq!(cell.value, PivotCellValue::Empty);
        assert_eq!(cell.formatted_value, "");
    }

    #[test]
    fn body_rows_exclude_headers() {
        let mut view = PivotView::new(1);
        view.column_header_row_count = 1;
        view.add_row(vec![PivotViewCell::column_header("Count".into())], header_row(0));
        for i in 0..3 {
            view.add_row(
                vec![PivotViewCell::data(Some(i as f64), i.to_string())],
                data_row(i + 1),
            );
        }
        assert_eq!(view.row_count, 4);
        assert_eq!(view.body_row_count(), 3);
        assert_eq!(view.find_text("2"), vec![(3, 0)]);
        assert_eq!(view.text_grid()[0], vec!["Count"]);
    }
}
