//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Shared value types for grouped query results.
//! CONTEXT: Re-exports public types and modules for use by the pivot engine
//! and the settings adapter.

pub mod number_format;
pub mod result;
pub mod value;

// Re-export commonly used types at the crate root
pub use number_format::{format_number, NumberFormat};
pub use result::{AggregationKind, ColumnRole, QueryResult, ResultColumn, PIVOT_GROUPING_KEY};
pub use value::{DimensionValue, EMPTY_LABEL};
