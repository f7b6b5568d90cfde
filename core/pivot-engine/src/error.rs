//! FILENAME: core/pivot-engine/src/error.rs
// PURPOSE: Error types for pivot building, collapse handling and fetch sequencing.

use thiserror::Error;

/// Message shown in place of the table when the query has no aggregation.
pub const UNAGGREGATED_MESSAGE: &str = "Pivot tables can only be used with aggregated queries.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PivotError {
    #[error("{}", UNAGGREGATED_MESSAGE)]
    UnaggregatedQuery,

    #[error("Unknown dimension in settings: {key}")]
    UnknownDimensionInSettings { key: String },

    #[error("Unknown measure: {key}")]
    UnknownMeasure { key: String },

    #[error("Row {row} has no value for column {key}")]
    MissingColumn { row: usize, key: String },

    #[error("Dimension {key} is assigned more than once")]
    DuplicateDimension { key: String },

    #[error("Stale fetch ignored (ticket {ticket}, latest {latest})")]
    StaleFetchIgnored { ticket: u64, latest: u64 },

    #[error("Invalid collapsed path: {0}")]
    InvalidCollapsedPath(String),
}

impl PivotError {
    /// Only the unaggregated-query condition is surfaced to the end user.
    /// Everything else is logged and degraded by the caller.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, PivotError::UnaggregatedQuery)
    }

    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            PivotError::UnaggregatedQuery => Some(UNAGGREGATED_MESSAGE),
            _ => None,
        }
    }
}

pub type PivotResult<T> = Result<T, PivotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unaggregated_is_user_visible() {
        assert!(PivotError::UnaggregatedQuery.is_user_visible());
        assert_eq!(
            PivotError::UnaggregatedQuery.to_string(),
            "Pivot tables can only be used with aggregated queries."
        );
        let stale = PivotError::StaleFetchIgnored { ticket: 1, latest: 2 };
        assert!(!stale.is_user_visible());
        assert_eq!(stale.user_message(), None);
    }
}
