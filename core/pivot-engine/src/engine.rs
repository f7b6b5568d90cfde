//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Calculation Engine - builds the renderable grid.
//!
//! Steps:
//! 1. Build both axis trees and the aggregate table from the grouped result
//! 2. Rebind the collapse state to the current axis dimensions
//! 3. Project each axis into its visible lines
//! 4. Emit header rows, row labels and one data cell per
//!    (visible row, visible column, measure)

use engine::{format_number, NumberFormat, QueryResult};

use crate::collapse::CollapseState;
use crate::definition::{Axis, ColumnSplit, DimensionKey, PivotDefinition, PivotId};
use crate::error::{PivotError, PivotResult};
use crate::path::DimensionPath;
use crate::projection::{cell_value, project_with, DisplayKind, DisplayRow, ProjectOptions};
use crate::tree::{PivotTree, TreeBuilder};
use crate::view::{
    BackgroundStyle, CollapseTarget, DimensionFilter, DrillThrough, PivotCellType,
    PivotColumnDescriptor, PivotColumnType, PivotRowDescriptor, PivotRowType, PivotView,
    PivotViewCell,
};
use crate::{log_debug, log_error, log_info, log_warn};

const ROW_LABEL_WIDTH: u32 = 120;
const DATA_COLUMN_WIDTH: u32 = 100;

// ============================================================================
// PIVOT CALCULATOR
// ============================================================================

pub struct PivotCalculator<'a> {
    definition: &'a PivotDefinition,
    tree: PivotTree,
    collapse: CollapseState,

    /// Display names of the row dimensions, outermost first.
    row_dimension_names: Vec<String>,

    /// Visible row-axis lines.
    row_items: Vec<DisplayRow>,

    /// Visible column-axis lines.
    col_items: Vec<DisplayRow>,

    /// Number format per measure, aligned with `tree.measures`.
    formats: Vec<NumberFormat>,
}

impl<'a> PivotCalculator<'a> {
    pub fn new(definition: &'a PivotDefinition, result: &QueryResult) -> PivotResult<Self> {
        if !result.is_aggregated() {
            return Err(PivotError::UnaggregatedQuery);
        }

        let dimensions = result.dimension_keys();
        let measures = result.measure_keys();
        let split = &definition.split;
        split.validate(&dimensions, &measures)?;
        let values = split.resolved_values(&measures);

        let tree = TreeBuilder::new(result, &split.rows, &split.columns, &values)
            .with_sorts(&definition.sorts)
            .build()?;

        let collapse = definition.bound_collapse();

        let row_items = if split.rows.is_empty() {
            vec![DisplayRow::grand_total(Axis::Row)]
        } else {
            project_with(
                &tree.rows,
                &collapse,
                &definition.show_totals,
                Axis::Row,
                ProjectOptions {
                    show_grand_total: definition.layout.show_row_grand_totals,
                },
            )
        };

        let col_items = if split.columns.is_empty() {
            vec![DisplayRow::grand_total(Axis::Column)]
        } else {
            project_with(
                &tree.columns,
                &collapse,
                &definition.show_totals,
                Axis::Column,
                ProjectOptions {
                    show_grand_total: definition.layout.show_column_grand_totals,
                },
            )
        };

        let row_dimension_names = split
            .rows
            .iter()
            .map(|key| {
                result
                    .column(key)
                    .map(|c| c.display_name.clone())
                    .unwrap_or_else(|| key.clone())
            })
            .collect();

        let formats = tree
            .measures
            .iter()
            .map(|m| definition.number_format(&m.key))
            .collect();

        log_debug!(
            "PIVOT",
            "pivot {}: {} visible rows, {} visible columns",
            definition.id,
            row_items.len(),
            col_items.len()
        );

        Ok(PivotCalculator {
            definition,
            tree,
            collapse,
            row_dimension_names,
            row_items,
            col_items,
            formats,
        })
    }

    pub fn tree(&self) -> &PivotTree {
        &self.tree
    }

    pub fn row_items(&self) -> &[DisplayRow] {
        &self.row_items
    }

    pub fn col_items(&self) -> &[DisplayRow] {
        &self.col_items
    }

    fn row_dimensions(&self) -> &[DimensionKey] {
        &self.tree.row_dimensions
    }

    fn column_dimensions(&self) -> &[DimensionKey] {
        &self.tree.column_dimensions
    }

    /// No column dimensions: the single column item stands for "all columns"
    /// and renders like ordinary data.
    fn has_column_axis(&self) -> bool {
        !self.column_dimensions().is_empty()
    }

    fn row_label_columns(&self) -> usize {
        self.row_dimensions().len().max(1)
    }

    /// One row per column dimension, plus measure names when they are
    /// needed to tell columns apart.
    fn column_header_rows(&self) -> usize {
        let base = self.column_dimensions().len();
        if self.tree.measures.len() > 1 || base == 0 {
            base + 1
        } else {
            base
        }
    }

    /// Generates the final PivotView.
    pub fn calculate(&self) -> PivotView {
        let mut view = PivotView::new(self.definition.id);
        view.version = self.definition.version;

        let row_label_cols = self.row_label_columns();
        let header_rows = self.column_header_rows();
        view.row_label_col_count = row_label_cols;
        view.column_header_row_count = header_rows;

        view.set_columns(self.generate_column_descriptors(row_label_cols));
        self.generate_column_headers(&mut view, row_label_cols, header_rows);
        self.generate_data_rows(&mut view);

        log_info!(
            "PIVOT",
            "pivot {} v{}: {}x{} grid",
            view.pivot_id,
            view.version,
            view.row_count,
            view.col_count
        );
        view
    }

    /// Each visible column item repeated once per measure.
    fn data_columns(&self) -> impl Iterator<Item = (&DisplayRow, usize)> + '_ {
        let measure_count = self.tree.measures.len();
        self.col_items
            .iter()
            .flat_map(move |item| (0..measure_count).map(move |m| (item, m)))
    }

    fn generate_column_descriptors(&self, row_label_cols: usize) -> Vec<PivotColumnDescriptor> {
        let widths = &self.definition.column_widths;
        let mut descriptors = Vec::new();

        for i in 0..row_label_cols {
            descriptors.push(PivotColumnDescriptor {
                view_col: i,
                col_type: PivotColumnType::RowLabel,
                depth: i as u8,
                width_hint: widths.left_header(i).unwrap_or(ROW_LABEL_WIDTH),
                path: DimensionPath::root(),
                measure: None,
            });
        }

        for (j, (item, m)) in self.data_columns().enumerate() {
            let col_type = match item.kind {
                DisplayKind::Leaf => PivotColumnType::Data,
                DisplayKind::Subtotal => PivotColumnType::Subtotal,
                DisplayKind::GrandTotal if self.has_column_axis() => PivotColumnType::GrandTotal,
                DisplayKind::GrandTotal => PivotColumnType::Data,
            };
            descriptors.push(PivotColumnDescriptor {
                view_col: row_label_cols + j,
                col_type,
                depth: item.depth() as u8,
                width_hint: widths.value_header(j).unwrap_or(DATA_COLUMN_WIDTH),
                path: item.path.clone(),
                measure: Some(self.tree.measures[m].key.clone()),
            });
        }

        descriptors
    }

    fn generate_column_headers(&self, view: &mut PivotView, row_label_cols: usize, header_rows: usize) {
        let column_dims = self.column_dimensions().len();

        for h in 0..header_rows {
            let mut cells = Vec::with_capacity(view.col_count);

            // Row dimension names sit in the corner of the last header row.
            for i in 0..row_label_cols {
                if h + 1 == header_rows {
                    cells.push(self.corner_cell(i));
                } else {
                    cells.push(PivotViewCell::corner(None));
                }
            }

            if h < column_dims {
                let mut previous: Option<(DisplayKind, DimensionPath)> = None;
                for (item, _) in self.data_columns() {
                    let group = header_group(item, h);
                    let show = group.is_some() && group != previous;
                    let cell = if show {
                        self.column_header_cell(item, h)
                    } else {
                        PivotViewCell::blank().with_cell_type(PivotCellType::ColumnHeader)
                    };
                    previous = group;
                    cells.push(cell);
                }
            } else {
                for (_, m) in self.data_columns() {
                    cells.push(PivotViewCell::column_header(
                        self.tree.measures[m].display_name.clone(),
                    ));
                }
            }

            view.add_row(
                cells,
                PivotRowDescriptor {
                    view_row: h,
                    row_type: PivotRowType::ColumnHeader,
                    depth: h as u8,
                    path: DimensionPath::root(),
                },
            );
        }
    }

    fn corner_cell(&self, index: usize) -> PivotViewCell {
        let Some(name) = self.row_dimension_names.get(index) else {
            return PivotViewCell::corner(None);
        };
        let cell = PivotViewCell::corner(Some(name.clone()));
        let dims = self.row_dimensions();
        if index + 1 < dims.len() && self.definition.show_totals.is_enabled(&dims[index]) {
            cell.with_toggle(
                CollapseTarget::Level {
                    axis: Axis::Row,
                    dimension: dims[index].clone(),
                },
                self.collapse.is_level_collapsed(Axis::Row, &dims[index]),
            )
        } else {
            cell
        }
    }

    /// Header label of a column item at header row `h`.
    fn column_header_cell(&self, item: &DisplayRow, h: usize) -> PivotViewCell {
        match item.kind {
            DisplayKind::GrandTotal => {
                PivotViewCell::column_header(item.label.clone()).as_total(BackgroundStyle::GrandTotal)
            }
            DisplayKind::Subtotal if h + 1 == item.path.len() => {
                let cell = PivotViewCell::column_header(item.label.clone())
                    .as_total(BackgroundStyle::Subtotal);
                if item.is_collapsed {
                    cell.with_toggle(
                        CollapseTarget::Group {
                            axis: Axis::Column,
                            path: item.path.clone(),
                        },
                        true,
                    )
                } else {
                    cell
                }
            }
            _ => {
                let label = item.path.values()[h].display_value();
                let cell = PivotViewCell::column_header(label);
                self.with_group_toggle(cell, Axis::Column, &item.path, h)
            }
        }
    }

    /// Adds an expand/collapse affordance to a non-innermost group header.
    fn with_group_toggle(
        &self,
        cell: PivotViewCell,
        axis: Axis,
        path: &DimensionPath,
        depth: usize,
    ) -> PivotViewCell {
        let dims = self.tree.dimensions(axis);
        if depth + 1 < dims.len() && self.definition.show_totals.is_enabled(&dims[depth]) {
            cell.with_toggle(
                CollapseTarget::Group {
                    axis,
                    path: path.prefix(depth + 1),
                },
                false,
            )
        } else {
            cell
        }
    }

    fn generate_data_rows(&self, view: &mut PivotView) {
        let row_label_cols = view.row_label_col_count;
        let row_dims = self.row_dimensions();
        let col_dims = self.column_dimensions();
        let mut previous: Option<DimensionPath> = None;

        for row_item in &self.row_items {
            let mut cells = Vec::with_capacity(view.col_count);

            for d in 0..row_label_cols {
                cells.push(self.row_label_cell(row_item, d, previous.as_ref()));
            }

            for (col_item, m) in self.data_columns() {
                let value = cell_value(&self.tree, row_item, col_item, m);
                let formatted = value
                    .map(|v| format_number(v, &self.formats[m]))
                    .unwrap_or_default();
                let mut filters = header_filters(row_dims, &row_item.path);
                filters.extend(header_filters(col_dims, &col_item.path));

                let cell = PivotViewCell::data(value, formatted).with_group_path(filters);
                cells.push(self.style_data_cell(cell, row_item, col_item));
            }

            let row_type = match row_item.kind {
                DisplayKind::Leaf => PivotRowType::Data,
                DisplayKind::Subtotal => PivotRowType::Subtotal,
                DisplayKind::GrandTotal => PivotRowType::GrandTotal,
            };
            let descriptor = PivotRowDescriptor {
                view_row: view.row_count,
                row_type,
                depth: row_item.depth() as u8,
                path: row_item.path.clone(),
            };
            view.add_row(cells, descriptor);

            previous = match row_item.kind {
                DisplayKind::GrandTotal => None,
                _ => Some(row_item.path.clone()),
            };
        }
    }

    /// Row label at label column `d`. Outer labels are shown only on the
    /// first row of their group.
    fn row_label_cell(
        &self,
        item: &DisplayRow,
        d: usize,
        previous: Option<&DimensionPath>,
    ) -> PivotViewCell {
        match item.kind {
            DisplayKind::GrandTotal => {
                if d == 0 {
                    PivotViewCell::row_header(item.label.clone(), 0)
                        .as_total(BackgroundStyle::GrandTotal)
                } else {
                    PivotViewCell::blank()
                }
            }
            DisplayKind::Subtotal if d + 1 == item.path.len() => {
                let cell = PivotViewCell::row_header(item.label.clone(), d as u8)
                    .as_total(BackgroundStyle::Subtotal);
                if item.is_collapsed {
                    cell.with_toggle(
                        CollapseTarget::Group {
                            axis: Axis::Row,
                            path: item.path.clone(),
                        },
                        true,
                    )
                } else {
                    cell
                }
            }
            _ if d < item.path.len() => {
                let prefix = item.path.prefix(d + 1);
                let repeated = previous
                    .map(|p| p.len() > d && p.prefix(d + 1) == prefix)
                    .unwrap_or(false);
                if repeated {
                    return PivotViewCell::blank();
                }
                let label = item.path.values()[d].display_value();
                let cell = PivotViewCell::row_header(label, d as u8);
                self.with_group_toggle(cell, Axis::Row, &item.path, d)
            }
            _ => PivotViewCell::blank(),
        }
    }

    fn style_data_cell(
        &self,
        cell: PivotViewCell,
        row_item: &DisplayRow,
        col_item: &DisplayRow,
    ) -> PivotViewCell {
        let col_kind = if self.has_column_axis() {
            col_item.kind
        } else {
            DisplayKind::Leaf
        };
        match (row_item.kind, col_kind) {
            (DisplayKind::GrandTotal, DisplayKind::GrandTotal) => cell
                .with_cell_type(PivotCellType::GrandTotal)
                .as_total(BackgroundStyle::GrandTotal),
            (DisplayKind::GrandTotal, _) => cell
                .with_cell_type(PivotCellType::GrandTotalRow)
                .as_total(BackgroundStyle::GrandTotal),
            (_, DisplayKind::GrandTotal) => cell
                .with_cell_type(PivotCellType::GrandTotalColumn)
                .as_total(BackgroundStyle::GrandTotal),
            (DisplayKind::Subtotal, _) => cell
                .with_cell_type(PivotCellType::RowSubtotal)
                .as_total(BackgroundStyle::Subtotal),
            (_, DisplayKind::Subtotal) => cell
                .with_cell_type(PivotCellType::ColumnSubtotal)
                .as_total(BackgroundStyle::Subtotal),
            _ => cell,
        }
    }
}

/// Grouping identity of a column item at header row `h`, used to show each
/// header label once across adjacent columns.
fn header_group(item: &DisplayRow, h: usize) -> Option<(DisplayKind, DimensionPath)> {
    match item.kind {
        DisplayKind::GrandTotal if h == 0 => Some((DisplayKind::GrandTotal, DimensionPath::root())),
        DisplayKind::GrandTotal => None,
        DisplayKind::Subtotal if h + 1 == item.path.len() => {
            Some((DisplayKind::Subtotal, item.path.clone()))
        }
        _ if h < item.path.len() => Some((DisplayKind::Leaf, item.path.prefix(h + 1))),
        _ => None,
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Calculates a pivot view from a definition and a grouped result.
pub fn calculate_pivot(definition: &PivotDefinition, result: &QueryResult) -> PivotResult<PivotView> {
    let calculator = PivotCalculator::new(definition, result)?;
    Ok(calculator.calculate())
}

/// What the host should display for a result.
#[derive(Debug, Clone, PartialEq)]
pub enum PivotOutcome {
    Pivot(PivotView),
    /// The pivot could not be built; the raw rows are shown instead.
    Flat(PivotView),
    /// User-visible message in place of the table.
    Message(String),
}

/// Like [`calculate_pivot`], but never fails: unaggregated queries yield the
/// user-facing message, a split that no longer matches the result is
/// replaced by the default split, and anything else falls back to a flat
/// table.
pub fn calculate_pivot_or_flat(definition: &PivotDefinition, result: &QueryResult) -> PivotOutcome {
    let mut error = match calculate_pivot(definition, result) {
        Ok(view) => return PivotOutcome::Pivot(view),
        Err(e) => e,
    };
    if let Some(message) = error.user_message() {
        return PivotOutcome::Message(message.to_string());
    }

    if is_stale_split(&error) {
        let split = ColumnSplit::default_for(&result.dimension_keys(), &result.measure_keys());
        log_warn!(
            "PIVOT",
            "pivot {}: stale column split ({}), using default",
            definition.id,
            error
        );
        match calculate_pivot(&definition.reassign(split), result) {
            Ok(view) => return PivotOutcome::Pivot(view),
            Err(e) => error = e,
        }
    }

    log_error!("PIVOT", "pivot {} failed, rendering flat table: {}", definition.id, error);
    PivotOutcome::Flat(render_flat_table(definition.id, result))
}

fn is_stale_split(error: &PivotError) -> bool {
    matches!(
        error,
        PivotError::UnknownDimensionInSettings { .. }
            | PivotError::DuplicateDimension { .. }
            | PivotError::UnknownMeasure { .. }
    )
}

/// Renders the leaf rows of a result as a plain table.
pub fn render_flat_table(pivot_id: PivotId, result: &QueryResult) -> PivotView {
    let mut view = PivotView::new(pivot_id);
    let grouping = result.grouping_index();
    let shown: Vec<usize> = (0..result.columns.len())
        .filter(|&i| Some(i) != grouping)
        .collect();

    view.column_header_row_count = 1;
    view.set_columns(
        shown
            .iter()
            .enumerate()
            .map(|(j, &i)| PivotColumnDescriptor {
                view_col: j,
                col_type: PivotColumnType::Data,
                depth: 0,
                width_hint: DATA_COLUMN_WIDTH,
                path: DimensionPath::root(),
                measure: result.columns[i]
                    .is_measure()
                    .then(|| result.columns[i].key.clone()),
            })
            .collect(),
    );

    view.add_row(
        shown
            .iter()
            .map(|&i| PivotViewCell::column_header(result.columns[i].display_name.clone()))
            .collect(),
        PivotRowDescriptor {
            view_row: 0,
            row_type: PivotRowType::ColumnHeader,
            depth: 0,
            path: DimensionPath::root(),
        },
    );

    let format = NumberFormat::default();
    for row in &result.rows {
        let rolled_up = grouping
            .and_then(|g| row.get(g))
            .and_then(|v| v.as_f64())
            .map(|mask| mask != 0.0)
            .unwrap_or(false);
        if rolled_up {
            continue;
        }
        let cells = shown
            .iter()
            .map(|&i| {
                let value = row.get(i).cloned().unwrap_or_default();
                if result.columns[i].is_measure() {
                    let n = value.as_f64();
                    PivotViewCell::data(n, n.map(|v| format_number(v, &format)).unwrap_or_default())
                } else {
                    PivotViewCell::row_header(value.display_value(), 0)
                }
            })
            .collect();
        let descriptor = PivotRowDescriptor {
            view_row: view.row_count,
            row_type: PivotRowType::Data,
            depth: 0,
            path: DimensionPath::root(),
        };
        view.add_row(cells, descriptor);
    }

    view
}

/// Filters fixing each dimension of `path` to its value.
pub fn header_filters(dimensions: &[DimensionKey], path: &DimensionPath) -> Vec<DimensionFilter> {
    dimensions
        .iter()
        .zip(path.values())
        .map(|(dimension, value)| DimensionFilter {
            dimension: dimension.clone(),
            value: value.clone(),
        })
        .collect()
}

/// Drill-through filters for the data cell at (row, col), or None when the
/// cell is not a value cell.
pub fn drill_through(view: &PivotView, row: usize, col: usize) -> Option<DrillThrough> {
    let cell = view.get_cell(row, col)?;
    match cell.cell_type {
        PivotCellType::Data
        | PivotCellType::RowSubtotal
        | PivotCellType::ColumnSubtotal
        | PivotCellType::GrandTotalRow
        | PivotCellType::GrandTotalColumn
        | PivotCellType::GrandTotal => Some(DrillThrough {
            pivot_id: view.pivot_id,
            filters: cell.group_path.clone(),
            measure: view.columns.get(col).and_then(|c| c.measure.clone()),
        }),
        _ => None,
    }
}
