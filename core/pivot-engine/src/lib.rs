//! FILENAME: core/pivot-engine/src/lib.rs
//! Pivot aggregation and collapse engine.
//!
//! Turns an already-grouped query result into a two-axis pivot: nested
//! dimension trees, subtotals and grand totals, and the visible row and
//! column sequences after collapse.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the pivot IS)
//! - `tree`: Axis hierarchies and the aggregate table (HOW we group)
//! - `collapse` / `projection`: What is visible
//! - `view`: Renderable output for the host (WHAT we display)
//! - `engine`: Calculation entry points

pub mod logging;

pub mod collapse;
pub mod definition;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod path;
pub mod projection;
pub mod tree;
pub mod view;

pub use collapse::*;
pub use definition::*;
pub use crate::engine::{
    calculate_pivot, calculate_pivot_or_flat, drill_through, header_filters, render_flat_table,
    PivotCalculator, PivotOutcome,
};
pub use error::{PivotError, PivotResult, UNAGGREGATED_MESSAGE};
pub use fetch::{FetchSequencer, FetchTicket};
pub use path::DimensionPath;
pub use projection::{cell_value, project, project_with, DisplayKind, DisplayRow, ProjectOptions};
pub use tree::{build_tree, GroupKey, GroupNode, MeasureSpec, MeasureValues, PivotTree, TreeBuilder};
pub use view::*;
