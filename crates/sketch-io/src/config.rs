use std::path::Path;

use sketch_core::SceneSettings;

use crate::error::ConfigError;

/// Read and validate a JSON settings file. Missing fields take their defaults.
pub fn load_settings(path: &Path) -> Result<SceneSettings, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = SceneSettings::from_json(&json).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    settings.validate().map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Write `settings` as pretty-printed JSON.
pub fn save_settings(path: &Path, settings: &SceneSettings) -> Result<(), ConfigError> {
    let json = settings.to_json().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
