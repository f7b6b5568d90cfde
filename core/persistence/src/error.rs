//! FILENAME: core/persistence/src/error.rs

use pivot_engine::PivotError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pivot error: {0}")]
    Pivot(#[from] PivotError),

    #[error("Invalid settings format: {0}")]
    InvalidFormat(String),
}
