//! FILENAME: core/persistence/src/store.rs
//! JSON load/save for visualization settings.

use std::fs;
use std::path::Path;

use pivot_engine::{log_debug, log_info};

use crate::error::SettingsError;
use crate::settings::VisualizationSettings;

/// Parses a settings object. The top level must be a JSON object.
pub fn from_json_str(text: &str) -> Result<VisualizationSettings, SettingsError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(SettingsError::InvalidFormat(
            "visualization settings must be a JSON object".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

pub fn to_json_string(settings: &VisualizationSettings) -> Result<String, SettingsError> {
    Ok(serde_json::to_string_pretty(settings)?)
}

pub fn load_settings(path: &Path) -> Result<VisualizationSettings, SettingsError> {
    let text = fs::read_to_string(path)?;
    let settings = from_json_str(&text)?;
    log_info!("SETTINGS", "loaded settings from {}", path.display());
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &VisualizationSettings) -> Result<(), SettingsError> {
    let text = to_json_string(settings)?;
    fs::write(path, text)?;
    log_debug!("SETTINGS", "saved settings to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            from_json_str("[1, 2]"),
            Err(SettingsError::InvalidFormat(_))
        ));
        assert!(matches!(from_json_str("{"), Err(SettingsError::Json(_))));
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(from_json_str("{}").unwrap(), VisualizationSettings::default());
    }
}
