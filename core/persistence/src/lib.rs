//! FILENAME: core/persistence/src/lib.rs
//! Pivot Settings Persistence
//!
//! Reads and writes the persisted visualization settings of a pivot table
//! and resolves them into a `PivotDefinition` for a specific query result.

mod convert;
mod error;
mod settings;
mod store;

pub use convert::{resolve_definition, settings_from_definition, ResolvedSettings, SettingsWarning};
pub use error::SettingsError;
pub use settings::{CollapsedEntries, MeasureSort, VisualizationSettings};
pub use store::{from_json_str, load_settings, save_settings, to_json_string};
